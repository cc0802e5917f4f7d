//! Contacts: raw directory schema, canonical model and normalization.

pub mod model;
pub mod normalize;
pub mod raw;
