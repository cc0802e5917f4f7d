//! Aggregate Cypher queries backing `GraphQueries`.

pub mod communities;
pub mod path;
pub mod stats;
