//! Persistence seam for contacts, edges and the sync token.
//!
//! The sync orchestrator and the HTTP layer only see these traits.
//! `sphere-graph` implements them on Neo4j; [`MemoryStore`] implements
//! them in process for tests and offline use.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::contact::model::Contact;
use crate::error::SphereResult;
use crate::insights::{Community, ContactPath, GraphStatistics};
use crate::relationship::model::{RelationshipEdge, RelationshipType};

/// Contacts, relationship edges and sync state.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Insert or update a contact by id. Returns `true` when it was new.
    ///
    /// On update, directory fields are overwritten while `tags`, `notes`
    /// and `created_at` are kept; `updated_at` is refreshed.
    async fn upsert_contact(&self, contact: &Contact) -> SphereResult<bool>;

    /// All contacts ordered by name, optionally filtered by a
    /// case-insensitive substring over the searchable fields.
    async fn get_contacts(&self, search: Option<&str>) -> SphereResult<Vec<Contact>>;

    async fn get_contact(&self, id: &str) -> SphereResult<Option<Contact>>;

    async fn get_uncategorized_contacts(&self) -> SphereResult<Vec<Contact>>;

    /// Remove a contact and every edge touching it. Returns `true` if it existed.
    async fn delete_contact(&self, id: &str) -> SphereResult<bool>;

    async fn count_contacts(&self) -> SphereResult<usize>;

    /// Remove every inferred edge, leaving contacts untouched.
    async fn clear_all_edges(&self) -> SphereResult<()>;

    async fn add_edge(&self, edge: &RelationshipEdge) -> SphereResult<()>;

    async fn add_edges(&self, edges: &[RelationshipEdge]) -> SphereResult<()> {
        for edge in edges {
            self.add_edge(edge).await?;
        }
        Ok(())
    }

    async fn get_edges(&self, relationship_type: Option<RelationshipType>) -> SphereResult<Vec<RelationshipEdge>>;

    /// Add a tag. Fails with `ContactNotFound` for unknown ids.
    async fn add_tag(&self, id: &str, tag: &str) -> SphereResult<Contact>;

    async fn remove_tag(&self, id: &str, tag: &str) -> SphereResult<Contact>;

    async fn update_notes(&self, id: &str, notes: &str) -> SphereResult<Contact>;

    async fn get_sync_token(&self) -> SphereResult<Option<String>>;

    async fn set_sync_token(&self, token: &str) -> SphereResult<()>;
}

/// Aggregate questions asked of the whole graph.
#[async_trait]
pub trait GraphQueries: Send + Sync {
    async fn graph_statistics(&self) -> SphereResult<GraphStatistics>;

    /// Shortest relationship chain between two contacts, if one exists
    /// within six hops.
    async fn shortest_path(&self, source_id: &str, target_id: &str) -> SphereResult<Option<ContactPath>>;

    async fn communities(&self) -> SphereResult<Vec<Community>>;
}

/// Everything a graph-backed deployment provides.
pub trait GraphBackend: ContactStore + GraphQueries {}

impl<T: ContactStore + GraphQueries> GraphBackend for T {}

/// Trim a user-supplied tag and reject empty ones.
pub fn clean_tag(tag: &str) -> SphereResult<String> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Err(crate::error::SphereError::validation("Tag must not be empty"));
    }
    Ok(tag.to_string())
}
