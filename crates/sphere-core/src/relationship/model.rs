//! Relationship edge models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SphereError;

/// The closed set of inferred relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    Colleague,
    Local,
    CountryMate,
    DomainMate,
    Alumni,
    BirthdayBuddy,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 6] = [
        Self::Colleague,
        Self::Local,
        Self::CountryMate,
        Self::DomainMate,
        Self::Alumni,
        Self::BirthdayBuddy,
    ];

    /// Wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colleague => "colleague",
            Self::Local => "local",
            Self::CountryMate => "country-mate",
            Self::DomainMate => "domain-mate",
            Self::Alumni => "alumni",
            Self::BirthdayBuddy => "birthday-buddy",
        }
    }

    /// Neo4j relationship label.
    pub fn graph_label(&self) -> &'static str {
        match self {
            Self::Colleague => "COLLEAGUE",
            Self::Local => "LOCAL",
            Self::CountryMate => "COUNTRY_MATE",
            Self::DomainMate => "DOMAIN_MATE",
            Self::Alumni => "ALUMNI",
            Self::BirthdayBuddy => "BIRTHDAY_BUDDY",
        }
    }

    /// Metadata key holding the attribute value the pair shares.
    pub fn metadata_key(&self) -> &'static str {
        match self {
            Self::Colleague => "organization",
            Self::Local => "city",
            Self::CountryMate => "country",
            Self::DomainMate => "domain",
            Self::Alumni => "school",
            Self::BirthdayBuddy => "birthday",
        }
    }

    /// Strength assigned to a freshly inferred edge.
    pub fn base_strength(&self) -> f64 {
        1.0
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = SphereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| SphereError::validation(format!("Unknown relationship type: {}", s)))
    }
}

/// An undirected relationship between two contacts.
///
/// `source_id <= target_id` always holds, so a pair has one representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    pub strength: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl RelationshipEdge {
    /// Build an edge with canonical endpoint ordering and base strength.
    pub fn new(a: &str, b: &str, relationship_type: RelationshipType) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source_id: source.to_string(),
            target_id: target.to_string(),
            relationship_type,
            strength: relationship_type.base_strength(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach the shared attribute value under the rule's metadata key.
    pub fn with_shared(mut self, value: impl Into<String>) -> Self {
        self.metadata
            .insert(self.relationship_type.metadata_key().to_string(), value.into());
        self
    }

    /// Whether this edge touches the given contact.
    pub fn involves(&self, contact_id: &str) -> bool {
        self.source_id == contact_id || self.target_id == contact_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_ordering() {
        let a = RelationshipEdge::new("zed", "amy", RelationshipType::Local);
        let b = RelationshipEdge::new("amy", "zed", RelationshipType::Local);
        assert_eq!(a, b);
        assert_eq!(a.source_id, "amy");
        assert_eq!(a.strength, 1.0);
    }

    #[test]
    fn test_type_round_trips_through_str() {
        for t in RelationshipType::ALL {
            assert_eq!(t.as_str().parse::<RelationshipType>().unwrap(), t);
        }
        assert_eq!(
            "COUNTRY_MATE".parse::<RelationshipType>().unwrap(),
            RelationshipType::CountryMate
        );
        assert!("best-friend".parse::<RelationshipType>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&RelationshipType::BirthdayBuddy).unwrap();
        assert_eq!(json, "\"birthday-buddy\"");
    }
}
