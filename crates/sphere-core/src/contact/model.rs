//! Contact domain model.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A canonical contact: one node of the relationship graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub previous_organization: Option<String>,
    pub school: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    /// Human-readable address assembled from the structured parts.
    pub address: Option<String>,
    /// Recurring birthday as `MM-DD`.
    pub birthday: Option<String>,
    pub photo_url: Option<String>,
    /// User-authored notes. Never overwritten by a sync once the contact exists.
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub raw_data: serde_json::Value,
    /// User-assigned tags. Never overwritten by a sync.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub uncategorized: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// Create a contact with only its identity set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut contact = Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            organization: None,
            previous_organization: None,
            school: None,
            city: None,
            country: None,
            street: None,
            postal_code: None,
            address: None,
            birthday: None,
            photo_url: None,
            notes: String::new(),
            raw_data: serde_json::Value::Null,
            tags: BTreeSet::new(),
            uncategorized: false,
            created_at: None,
            updated_at: None,
        };
        contact.uncategorized = contact.lacks_signal();
        contact
    }

    /// True when organization, city, country and email are all absent.
    pub fn lacks_signal(&self) -> bool {
        [&self.organization, &self.city, &self.country, &self.email]
            .iter()
            .all(|field| field.as_deref().map(str::trim).unwrap_or("").is_empty())
    }

    /// Case-insensitive substring match against every searchable field.
    ///
    /// `term` must already be lower-cased.
    pub fn matches_search(&self, term: &str) -> bool {
        let fields = [
            Some(self.name.as_str()),
            self.email.as_deref(),
            self.phone.as_deref(),
            self.organization.as_deref(),
            self.previous_organization.as_deref(),
            self.school.as_deref(),
            self.city.as_deref(),
            self.country.as_deref(),
            self.address.as_deref(),
            self.birthday.as_deref(),
            Some(self.notes.as_str()),
        ];

        fields
            .iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(term))
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(term))
    }
}
