//! Contact directory abstraction.
//!
//! A directory hands out raw person records one page at a time. The
//! first page of a full fetch carries no tokens; the last page of any
//! fetch carries a sync token that makes the next fetch incremental.

use async_trait::async_trait;
use thiserror::Error;

use crate::contact::raw::RawPerson;

/// Cursor for the next page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Continuation token from the previous page.
    pub page_token: Option<String>,
    /// Token from the last completed sync; present for incremental fetches.
    pub sync_token: Option<String>,
}

impl PageRequest {
    pub fn full() -> Self {
        Self::default()
    }

    pub fn incremental(sync_token: impl Into<String>) -> Self {
        Self { page_token: None, sync_token: Some(sync_token.into()) }
    }

    pub fn is_incremental(&self) -> bool {
        self.sync_token.is_some()
    }
}

/// One page of records.
#[derive(Debug, Clone, Default)]
pub struct DirectoryPage {
    pub records: Vec<RawPerson>,
    pub next_page_token: Option<String>,
    pub next_sync_token: Option<String>,
    /// Records the directory sent that could not be decoded.
    pub undecodable: usize,
}

impl DirectoryPage {
    /// True when no further page follows.
    pub fn is_last(&self) -> bool {
        self.next_page_token.as_deref().map_or(true, str::is_empty)
    }
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Directory credentials were rejected")]
    Unauthorized,

    #[error("Sync token expired; a full fetch is required")]
    SyncTokenExpired,

    #[error("Directory returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Directory request failed: {0}")]
    Request(String),

    #[error("Malformed directory response: {0}")]
    Decode(String),
}

/// Paged source of raw person records.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<DirectoryPage, DirectoryError>;
}
