//! Relationship edges and the rules that infer them.

pub mod inference;
pub mod model;
