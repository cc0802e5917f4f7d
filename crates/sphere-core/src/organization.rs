//! Derived organization aggregates.
//!
//! Organizations are not stored as authoritative state; they are grouped
//! from `Contact.organization` whenever someone asks for them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contact::model::Contact;
use crate::relationship::inference::normalize_key;

/// A company or affiliation with one or more member contacts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationNode {
    /// `org_` followed by a slug of the normalized name.
    pub id: String,
    pub name: String,
    pub member_ids: Vec<String>,
    pub employee_count: usize,
}

/// Group contacts by case-insensitive organization name.
///
/// The display name is the spelling used by the lowest contact id, and
/// the result is ordered by organization id.
pub fn derive_organizations(contacts: &[Contact]) -> Vec<OrganizationNode> {
    let mut sorted: Vec<&Contact> = contacts.iter().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    let mut groups: BTreeMap<String, OrganizationNode> = BTreeMap::new();
    for contact in sorted {
        let Some(key) = normalize_key(contact.organization.as_deref()) else {
            continue;
        };
        let display = contact.organization.as_deref().unwrap_or_default().trim().to_string();

        let node = groups.entry(org_id(&key)).or_insert_with_key(|id| OrganizationNode {
            id: id.clone(),
            name: display,
            member_ids: Vec::new(),
            employee_count: 0,
        });
        node.member_ids.push(contact.id.clone());
        node.employee_count += 1;
    }

    groups.into_values().collect()
}

/// Stable organization id: `org_` + lower-case alphanumeric slug.
pub fn org_id(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    format!("org_{}", slug.trim_matches('_'))
}
