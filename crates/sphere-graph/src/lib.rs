//! # Sphere Graph
//!
//! Neo4j persistence for ContactSphere.
//!
//! Contacts are `(:Contact)` nodes keyed by id, inferred relationships are
//! typed edges between them, and the directory sync token lives on a
//! single `(:SyncMeta)` node.

pub mod client;
pub mod queries;
pub mod schema;
pub mod store;

pub use client::GraphClient;
pub use schema::initialize_schema;
pub use store::Neo4jStore;
