//! # Sphere People
//!
//! Paged contact directory client for the Google People API
//! (`people/me/connections`), implementing `DirectoryClient`.

pub mod client;

pub use client::PeopleClient;
