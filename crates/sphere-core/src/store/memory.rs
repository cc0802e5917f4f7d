//! In-process store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{clean_tag, ContactStore, GraphQueries};
use crate::contact::model::Contact;
use crate::error::{SphereError, SphereResult};
use crate::insights::{self, Community, ContactPath, GraphStatistics};
use crate::relationship::model::{RelationshipEdge, RelationshipType};

#[derive(Debug, Default)]
struct State {
    contacts: BTreeMap<String, Contact>,
    edges: Vec<RelationshipEdge>,
    sync_token: Option<String>,
}

impl State {
    fn sorted_contacts(&self) -> Vec<Contact> {
        let mut contacts: Vec<Contact> = self.contacts.values().cloned().collect();
        contacts.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        contacts
    }

    fn contact_mut(&mut self, id: &str) -> SphereResult<&mut Contact> {
        self.contacts
            .get_mut(id)
            .ok_or_else(|| SphereError::ContactNotFound(id.to_string()))
    }
}

/// Store backed by in-memory maps behind an async lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn upsert_contact(&self, contact: &Contact) -> SphereResult<bool> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        let mut incoming = contact.clone();
        incoming.uncategorized = incoming.lacks_signal();
        incoming.updated_at = Some(now);

        match state.contacts.get_mut(&contact.id) {
            Some(existing) => {
                incoming.tags = std::mem::take(&mut existing.tags);
                incoming.notes = std::mem::take(&mut existing.notes);
                incoming.created_at = existing.created_at.or(Some(now));
                *existing = incoming;
                Ok(false)
            }
            None => {
                incoming.created_at = Some(now);
                state.contacts.insert(contact.id.clone(), incoming);
                Ok(true)
            }
        }
    }

    async fn get_contacts(&self, search: Option<&str>) -> SphereResult<Vec<Contact>> {
        let state = self.state.read().await;
        let contacts = state.sorted_contacts();

        match search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) {
            Some(term) => Ok(contacts.into_iter().filter(|c| c.matches_search(&term)).collect()),
            None => Ok(contacts),
        }
    }

    async fn get_contact(&self, id: &str) -> SphereResult<Option<Contact>> {
        Ok(self.state.read().await.contacts.get(id).cloned())
    }

    async fn get_uncategorized_contacts(&self) -> SphereResult<Vec<Contact>> {
        let state = self.state.read().await;
        Ok(state.sorted_contacts().into_iter().filter(|c| c.uncategorized).collect())
    }

    async fn delete_contact(&self, id: &str) -> SphereResult<bool> {
        let mut state = self.state.write().await;
        let existed = state.contacts.remove(id).is_some();
        if existed {
            state.edges.retain(|e| !e.involves(id));
        }
        Ok(existed)
    }

    async fn count_contacts(&self) -> SphereResult<usize> {
        Ok(self.state.read().await.contacts.len())
    }

    async fn clear_all_edges(&self) -> SphereResult<()> {
        self.state.write().await.edges.clear();
        Ok(())
    }

    async fn add_edge(&self, edge: &RelationshipEdge) -> SphereResult<()> {
        let mut state = self.state.write().await;
        for id in [&edge.source_id, &edge.target_id] {
            if !state.contacts.contains_key(id.as_str()) {
                return Err(SphereError::ContactNotFound(id.clone()));
            }
        }
        state.edges.push(edge.clone());
        Ok(())
    }

    async fn get_edges(&self, relationship_type: Option<RelationshipType>) -> SphereResult<Vec<RelationshipEdge>> {
        let state = self.state.read().await;
        Ok(state
            .edges
            .iter()
            .filter(|e| relationship_type.map_or(true, |t| e.relationship_type == t))
            .cloned()
            .collect())
    }

    async fn add_tag(&self, id: &str, tag: &str) -> SphereResult<Contact> {
        let tag = clean_tag(tag)?;
        let mut state = self.state.write().await;
        let contact = state.contact_mut(id)?;
        contact.tags.insert(tag);
        contact.updated_at = Some(Utc::now());
        Ok(contact.clone())
    }

    async fn remove_tag(&self, id: &str, tag: &str) -> SphereResult<Contact> {
        let tag = clean_tag(tag)?;
        let mut state = self.state.write().await;
        let contact = state.contact_mut(id)?;
        contact.tags.remove(&tag);
        contact.updated_at = Some(Utc::now());
        Ok(contact.clone())
    }

    async fn update_notes(&self, id: &str, notes: &str) -> SphereResult<Contact> {
        let mut state = self.state.write().await;
        let contact = state.contact_mut(id)?;
        contact.notes = notes.to_string();
        contact.updated_at = Some(Utc::now());
        Ok(contact.clone())
    }

    async fn get_sync_token(&self) -> SphereResult<Option<String>> {
        Ok(self.state.read().await.sync_token.clone())
    }

    async fn set_sync_token(&self, token: &str) -> SphereResult<()> {
        self.state.write().await.sync_token = Some(token.to_string());
        Ok(())
    }
}

#[async_trait]
impl GraphQueries for MemoryStore {
    async fn graph_statistics(&self) -> SphereResult<GraphStatistics> {
        let state = self.state.read().await;
        let contacts: Vec<Contact> = state.contacts.values().cloned().collect();
        Ok(insights::graph_statistics(&contacts, &state.edges))
    }

    async fn shortest_path(&self, source_id: &str, target_id: &str) -> SphereResult<Option<ContactPath>> {
        let state = self.state.read().await;
        let contacts: Vec<Contact> = state.contacts.values().cloned().collect();
        Ok(insights::shortest_path(&contacts, &state.edges, source_id, target_id))
    }

    async fn communities(&self) -> SphereResult<Vec<Community>> {
        let state = self.state.read().await;
        let contacts: Vec<Contact> = state.contacts.values().cloned().collect();
        Ok(insights::communities(&contacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme(id: &str, name: &str) -> Contact {
        Contact { organization: Some("Acme".into()), ..Contact::new(id, name) }
    }

    #[tokio::test]
    async fn test_upsert_reports_new_then_update() {
        let store = MemoryStore::new();
        assert!(store.upsert_contact(&acme("c1", "Alice")).await.unwrap());
        assert!(!store.upsert_contact(&acme("c1", "Alice B.")).await.unwrap());

        let stored = store.get_contact("c1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Alice B.");
        assert!(stored.created_at.is_some());
        assert_eq!(store.count_contacts().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_repeated_upsert_is_idempotent() {
        let raw = crate::contact::raw::RawPerson::from_json(serde_json::json!({
            "resourceName": "people/c1",
            "names": [{ "displayName": "Alice Martin" }],
            "emailAddresses": [{ "value": "alice@acme.io" }],
            "organizations": [{ "name": "Acme", "title": "CTO" }],
            "addresses": [{ "city": "Paris", "countryCode": "FR" }],
            "birthdays": [{ "date": { "month": 3, "day": 15 } }],
            "biographies": [{ "value": "Met at RustConf" }]
        }))
        .unwrap();
        let contact = crate::contact::normalize::normalize(&raw).unwrap();

        let store = MemoryStore::new();
        assert!(store.upsert_contact(&contact).await.unwrap());
        let first = store.get_contact("c1").await.unwrap().unwrap();
        assert!(!store.upsert_contact(&contact).await.unwrap());
        let second = store.get_contact("c1").await.unwrap().unwrap();

        assert_eq!(store.count_contacts().await.unwrap(), 1);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(
            Contact { updated_at: None, ..first },
            Contact { updated_at: None, ..second }
        );
    }

    #[tokio::test]
    async fn test_upsert_preserves_user_fields() {
        let store = MemoryStore::new();
        store
            .upsert_contact(&Contact { notes: "from bio".into(), ..acme("c1", "Alice") })
            .await
            .unwrap();
        store.add_tag("c1", "  friend ").await.unwrap();
        store.update_notes("c1", "met at conf").await.unwrap();
        let created = store.get_contact("c1").await.unwrap().unwrap().created_at;

        let refreshed = Contact { notes: "new bio".into(), ..Contact::new("c1", "Alice") };
        store.upsert_contact(&refreshed).await.unwrap();

        let stored = store.get_contact("c1").await.unwrap().unwrap();
        assert!(stored.tags.contains("friend"));
        assert_eq!(stored.notes, "met at conf");
        assert_eq!(stored.created_at, created);
        assert!(stored.uncategorized);
        assert_eq!(stored.organization, None);
    }

    #[tokio::test]
    async fn test_search_and_ordering() {
        let store = MemoryStore::new();
        store.upsert_contact(&acme("c2", "Zoe")).await.unwrap();
        store.upsert_contact(&acme("c1", "Adam")).await.unwrap();
        store.upsert_contact(&Contact::new("c3", "Mia")).await.unwrap();

        let all = store.get_contacts(None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Adam", "Mia", "Zoe"]);

        let found = store.get_contacts(Some("ACME")).await.unwrap();
        assert_eq!(found.len(), 2);

        let uncategorized = store.get_uncategorized_contacts().await.unwrap();
        assert_eq!(uncategorized.len(), 1);
        assert_eq!(uncategorized[0].id, "c3");
    }

    #[tokio::test]
    async fn test_tag_errors() {
        let store = MemoryStore::new();
        store.upsert_contact(&acme("c1", "Alice")).await.unwrap();

        assert!(matches!(store.add_tag("c1", "   ").await, Err(SphereError::Validation(_))));
        assert!(matches!(
            store.add_tag("missing", "x").await,
            Err(SphereError::ContactNotFound(_))
        ));

        store.add_tag("c1", "vip").await.unwrap();
        let contact = store.remove_tag("c1", "vip").await.unwrap();
        assert!(contact.tags.is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_touching_edges() {
        let store = MemoryStore::new();
        store.upsert_contact(&acme("a", "A")).await.unwrap();
        store.upsert_contact(&acme("b", "B")).await.unwrap();
        store.upsert_contact(&acme("c", "C")).await.unwrap();
        store
            .add_edges(&[
                RelationshipEdge::new("a", "b", RelationshipType::Colleague),
                RelationshipEdge::new("b", "c", RelationshipType::Colleague),
            ])
            .await
            .unwrap();

        assert!(store.delete_contact("a").await.unwrap());
        assert!(!store.delete_contact("a").await.unwrap());

        let edges = store.get_edges(None).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_id, "b");
    }

    #[tokio::test]
    async fn test_edge_requires_known_endpoints() {
        let store = MemoryStore::new();
        store.upsert_contact(&acme("a", "A")).await.unwrap();
        let edge = RelationshipEdge::new("a", "ghost", RelationshipType::Local);
        assert!(store.add_edge(&edge).await.is_err());
    }

    #[tokio::test]
    async fn test_sync_token_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_sync_token().await.unwrap(), None);
        store.set_sync_token("tok-1").await.unwrap();
        assert_eq!(store.get_sync_token().await.unwrap().as_deref(), Some("tok-1"));
    }
}
