//! Relationship inference engine.
//!
//! Every unordered pair of contacts is checked against each rule
//! independently, so one pair can carry several edge types but never
//! two edges of the same type. Instead of comparing all n^2 pairs, each
//! rule first buckets contacts by its match key and only pairs contacts
//! inside a bucket, which yields the same edge set.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use super::model::{RelationshipEdge, RelationshipType};
use crate::config::InferenceConfig;
use crate::contact::model::Contact;

/// Computes relationship edges from a set of canonical contacts.
#[derive(Debug, Clone, Default)]
pub struct InferenceEngine {
    config: InferenceConfig,
}

impl InferenceEngine {
    pub fn new(config: InferenceConfig) -> Self {
        Self { config }
    }

    /// Infer every relationship edge between `contacts`.
    ///
    /// The output is sorted by (type, source, target) and depends only on
    /// the contact set, not on its order.
    pub fn infer_all_relationships(&self, contacts: &[Contact]) -> Vec<RelationshipEdge> {
        let mut edges = Vec::new();

        for rule in RelationshipType::ALL {
            let before = edges.len();
            let buckets = self.bucket(contacts, rule);
            self.pair_within_buckets(contacts, rule, &buckets, &mut edges);
            debug!(rule = %rule, buckets = buckets.len(), edges = edges.len() - before, "Applied rule");
        }

        edges.sort_by(|a, b| {
            (a.relationship_type, &a.source_id, &a.target_id)
                .cmp(&(b.relationship_type, &b.source_id, &b.target_id))
        });

        info!(contacts = contacts.len(), edges = edges.len(), "Inferred relationships");
        edges
    }

    /// Group contact indices by the rule's match key(s).
    fn bucket(&self, contacts: &[Contact], rule: RelationshipType) -> BTreeMap<String, Vec<usize>> {
        let mut buckets: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, contact) in contacts.iter().enumerate() {
            for key in self.match_keys(contact, rule) {
                buckets.entry(key).or_default().push(index);
            }
        }
        buckets.retain(|_, members| members.len() > 1);
        buckets
    }

    fn pair_within_buckets(
        &self,
        contacts: &[Contact],
        rule: RelationshipType,
        buckets: &BTreeMap<String, Vec<usize>>,
        edges: &mut Vec<RelationshipEdge>,
    ) {
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

        for (key, members) in buckets {
            if let Some(max) = self.config.max_group_size {
                if members.len() > max {
                    debug!(rule = %rule, key = %key, size = members.len(), max, "Skipping oversized group");
                    continue;
                }
            }

            for (offset, &i) in members.iter().enumerate() {
                for &j in &members[offset + 1..] {
                    let (a, b) = (&contacts[i], &contacts[j]);
                    if a.id == b.id || !pair_qualifies(rule, a, b) {
                        continue;
                    }

                    let edge = RelationshipEdge::new(&a.id, &b.id, rule).with_shared(key.as_str());
                    if seen.insert((edge.source_id.clone(), edge.target_id.clone())) {
                        edges.push(edge);
                    }
                }
            }
        }
    }

    /// The normalized keys a contact contributes to a rule's buckets.
    pub fn match_keys(&self, contact: &Contact, rule: RelationshipType) -> Vec<String> {
        match rule {
            RelationshipType::Colleague => normalize_key(contact.organization.as_deref()).into_iter().collect(),
            RelationshipType::Local => normalize_key(contact.city.as_deref()).into_iter().collect(),
            RelationshipType::CountryMate => normalize_key(contact.country.as_deref()).into_iter().collect(),
            RelationshipType::DomainMate => contact
                .email
                .as_deref()
                .and_then(email_domain)
                .filter(|domain| self.is_meaningful_domain(domain))
                .into_iter()
                .collect(),
            RelationshipType::Alumni => self.school_keys(contact).into_iter().collect(),
            RelationshipType::BirthdayBuddy => contact
                .birthday
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(str::to_string)
                .into_iter()
                .collect(),
        }
    }

    /// Whether a mail domain identifies an organization rather than a free provider.
    pub fn is_meaningful_domain(&self, domain: &str) -> bool {
        !self.config.consumer_domains.contains(domain)
    }

    /// Schools a contact attended: the recorded school, plus the current
    /// organization when its name reads like an educational institution or
    /// names a known school.
    pub fn school_keys(&self, contact: &Contact) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        if let Some(school) = normalize_key(contact.school.as_deref()) {
            keys.insert(school);
        }
        if let Some(org) = normalize_key(contact.organization.as_deref()) {
            let by_keyword = self.config.school_keywords.iter().any(|kw| org.contains(kw.as_str()));
            let by_name = org
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| self.config.known_schools.contains(word));
            if by_keyword || by_name {
                keys.insert(org);
            }
        }
        keys
    }
}

/// Infer relationships with the default rule configuration.
pub fn infer_all_relationships(contacts: &[Contact]) -> Vec<RelationshipEdge> {
    InferenceEngine::default().infer_all_relationships(contacts)
}

/// Trimmed, lower-cased value; `None` when empty.
pub fn normalize_key(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// The lower-cased part after `@`, if any.
pub fn email_domain(email: &str) -> Option<String> {
    let (_, domain) = email.trim().rsplit_once('@')?;
    normalize_key(Some(domain))
}

/// Extra pair conditions beyond sharing a bucket.
fn pair_qualifies(rule: RelationshipType, a: &Contact, b: &Contact) -> bool {
    match rule {
        // Same-city pairs are already `local`; country-mate is the fallback tier.
        RelationshipType::CountryMate => {
            match (normalize_key(a.city.as_deref()), normalize_key(b.city.as_deref())) {
                (Some(city_a), Some(city_b)) => city_a != city_b,
                _ => true,
            }
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, name: &str) -> Contact {
        Contact::new(id, name)
    }

    fn of_type(edges: &[RelationshipEdge], t: RelationshipType) -> Vec<&RelationshipEdge> {
        edges.iter().filter(|e| e.relationship_type == t).collect()
    }

    #[test]
    fn test_colleague_case_insensitive() {
        let a = Contact { organization: Some("Acme".into()), ..contact("a", "A") };
        let b = Contact { organization: Some("  acme ".into()), ..contact("b", "B") };

        let edges = infer_all_relationships(&[a, b]);
        let colleagues = of_type(&edges, RelationshipType::Colleague);
        assert_eq!(colleagues.len(), 1);
        assert_eq!(colleagues[0].source_id, "a");
        assert_eq!(colleagues[0].target_id, "b");
        assert_eq!(colleagues[0].metadata.get("organization").map(String::as_str), Some("acme"));
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let alice = Contact { organization: Some("Acme".into()), city: Some("Paris".into()), ..contact("alice", "Alice") };
        let bob = Contact { organization: Some("acme".into()), city: Some("Paris".into()), ..contact("bob", "Bob") };
        let carol = Contact { organization: Some("Other".into()), city: Some("Paris".into()), ..contact("carol", "Carol") };

        let edges = infer_all_relationships(&[alice, bob, carol]);
        let found: Vec<(&str, &str, RelationshipType)> = edges
            .iter()
            .map(|e| (e.source_id.as_str(), e.target_id.as_str(), e.relationship_type))
            .collect();

        assert_eq!(
            found,
            vec![
                ("alice", "bob", RelationshipType::Colleague),
                ("alice", "bob", RelationshipType::Local),
                ("alice", "carol", RelationshipType::Local),
                ("bob", "carol", RelationshipType::Local),
            ]
        );
    }

    #[test]
    fn test_domain_mate_excludes_consumer_domains() {
        let gmail_a = Contact { email: Some("x@gmail.com".into()), ..contact("1", "X") };
        let gmail_b = Contact { email: Some("y@GMAIL.com".into()), ..contact("2", "Y") };
        let acme_a = Contact { email: Some("x@acme.io".into()), ..contact("3", "X2") };
        let acme_b = Contact { email: Some("y@Acme.IO".into()), ..contact("4", "Y2") };

        let edges = infer_all_relationships(&[gmail_a, gmail_b, acme_a, acme_b]);
        let domain = of_type(&edges, RelationshipType::DomainMate);
        assert_eq!(domain.len(), 1);
        assert_eq!((domain[0].source_id.as_str(), domain[0].target_id.as_str()), ("3", "4"));
        assert_eq!(domain[0].metadata.get("domain").map(String::as_str), Some("acme.io"));
    }

    #[test]
    fn test_country_mate_is_fallback_tier() {
        let paris = Contact { city: Some("Paris".into()), country: Some("FR".into()), ..contact("1", "P") };
        let paris2 = Contact { city: Some("paris".into()), country: Some("fr".into()), ..contact("2", "P2") };
        let lyon = Contact { city: Some("Lyon".into()), country: Some("FR".into()), ..contact("3", "L") };
        let nowhere = Contact { country: Some("FR".into()), ..contact("4", "N") };

        let edges = infer_all_relationships(&[paris, paris2, lyon, nowhere]);

        let local = of_type(&edges, RelationshipType::Local);
        assert_eq!(local.len(), 1);

        let country: BTreeSet<(&str, &str)> = of_type(&edges, RelationshipType::CountryMate)
            .iter()
            .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
            .collect();
        let expected: BTreeSet<(&str, &str)> =
            [("1", "3"), ("1", "4"), ("2", "3"), ("2", "4"), ("3", "4")].into_iter().collect();
        assert_eq!(country, expected);
    }

    #[test]
    fn test_birthday_buddy() {
        let a = Contact { birthday: Some("03-15".into()), ..contact("1", "A") };
        let b = Contact { birthday: Some("03-15".into()), ..contact("2", "B") };
        let c = Contact { birthday: Some("07-20".into()), ..contact("3", "C") };

        let edges = infer_all_relationships(&[a, b, c]);
        let buddies = of_type(&edges, RelationshipType::BirthdayBuddy);
        assert_eq!(buddies.len(), 1);
        assert_eq!(buddies[0].metadata.get("birthday").map(String::as_str), Some("03-15"));
    }

    #[test]
    fn test_alumni_from_school_field_and_keyword_org() {
        let a = Contact { school: Some("Stanford University".into()), ..contact("1", "A") };
        let b = Contact { organization: Some("stanford university".into()), ..contact("2", "B") };
        let c = Contact { organization: Some("Stanford Health".into()), ..contact("3", "C") };

        let edges = infer_all_relationships(&[a, b, c]);
        let alumni = of_type(&edges, RelationshipType::Alumni);
        assert_eq!(alumni.len(), 1);
        assert_eq!((alumni[0].source_id.as_str(), alumni[0].target_id.as_str()), ("1", "2"));
    }

    #[test]
    fn test_alumni_from_known_school_name() {
        let a = Contact { organization: Some("MIT".into()), ..contact("1", "A") };
        let b = Contact { school: Some("mit".into()), ..contact("2", "B") };
        let c = Contact { organization: Some("Smith & Co".into()), ..contact("3", "C") };
        let d = Contact { school: Some("smith & co".into()), ..contact("4", "D") };

        let engine = InferenceEngine::default();
        assert!(engine.school_keys(&a).contains("mit"));
        assert!(engine.school_keys(&c).is_empty());

        let edges = engine.infer_all_relationships(&[a, b, c, d]);
        let alumni = of_type(&edges, RelationshipType::Alumni);
        assert_eq!(alumni.len(), 1);
        assert_eq!((alumni[0].source_id.as_str(), alumni[0].target_id.as_str()), ("1", "2"));
    }

    #[test]
    fn test_alumni_emitted_once_per_pair() {
        let a = Contact {
            school: Some("MIT".into()),
            organization: Some("Harvard University".into()),
            ..contact("1", "A")
        };
        let b = Contact {
            school: Some("mit".into()),
            organization: Some("Harvard University".into()),
            ..contact("2", "B")
        };

        let edges = infer_all_relationships(&[a, b]);
        assert_eq!(of_type(&edges, RelationshipType::Alumni).len(), 1);
        assert_eq!(of_type(&edges, RelationshipType::Colleague).len(), 1);
    }

    #[test]
    fn test_missing_fields_never_match() {
        let a = Contact { email: Some("not-an-email".into()), ..contact("1", "A") };
        let b = Contact { email: Some("also-not".into()), ..contact("2", "B") };
        assert!(infer_all_relationships(&[a, b]).is_empty());
        assert!(infer_all_relationships(&[]).is_empty());
    }

    #[test]
    fn test_order_independent() {
        let contacts = vec![
            Contact { organization: Some("Acme".into()), city: Some("Berlin".into()), ..contact("k", "K") },
            Contact { organization: Some("ACME".into()), email: Some("j@acme.io".into()), ..contact("j", "J") },
            Contact { city: Some("berlin".into()), email: Some("m@acme.io".into()), ..contact("m", "M") },
            Contact { birthday: Some("01-01".into()), country: Some("DE".into()), ..contact("a", "A") },
            Contact { birthday: Some("01-01".into()), country: Some("de".into()), ..contact("z", "Z") },
        ];
        let mut reversed = contacts.clone();
        reversed.reverse();

        let first = infer_all_relationships(&contacts);
        let second = infer_all_relationships(&reversed);
        assert_eq!(first, second);
        assert_eq!(first, infer_all_relationships(&contacts));
    }

    #[test]
    fn test_max_group_size_skips_large_buckets() {
        let config = InferenceConfig { max_group_size: Some(2), ..InferenceConfig::default() };
        let engine = InferenceEngine::new(config);

        let big: Vec<Contact> = (0..3)
            .map(|i| Contact { organization: Some("Megacorp".into()), ..contact(&format!("m{}", i), "M") })
            .collect();
        let small = vec![
            Contact { organization: Some("Tiny".into()), ..contact("t1", "T1") },
            Contact { organization: Some("Tiny".into()), ..contact("t2", "T2") },
        ];
        let all: Vec<Contact> = big.into_iter().chain(small).collect();

        let edges = engine.infer_all_relationships(&all);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].metadata.get("organization").map(String::as_str), Some("tiny"));
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(email_domain("test@example.com").as_deref(), Some("example.com"));
        assert_eq!(email_domain("user@DOMAIN.ORG").as_deref(), Some("domain.org"));
        assert!(email_domain("invalid_email").is_none());
        assert!(email_domain("trailing@").is_none());
    }
}
