//! ContactSphere Core Library
//!
//! Turns a raw contact-directory export into a relationship graph:
//! contacts are normalized, relationships are inferred from shared
//! attributes, and both are reconciled against a persistent store on
//! every sync.

pub mod config;
pub mod contact;
pub mod directory;
pub mod error;
pub mod insights;
pub mod organization;
pub mod relationship;
pub mod store;
pub mod sync;

pub use config::SphereConfig;
pub use contact::model::Contact;
pub use contact::normalize::normalize;
pub use contact::raw::RawPerson;
pub use directory::{DirectoryClient, DirectoryError, DirectoryPage, PageRequest};
pub use error::{SphereError, SphereResult};
pub use organization::OrganizationNode;
pub use relationship::inference::{infer_all_relationships, InferenceEngine};
pub use relationship::model::{RelationshipEdge, RelationshipType};
pub use store::{ContactStore, GraphBackend, GraphQueries, MemoryStore};
pub use sync::{run_sync, SyncReport};
