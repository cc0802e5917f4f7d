//! Route handlers.

pub mod contacts;
pub mod graph;
pub mod sync;

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use sphere_core::SphereError;

/// Error half of every handler result.
pub type ApiError = (StatusCode, String);

/// Map a core error onto an HTTP status.
pub fn api_error(err: SphereError) -> ApiError {
    match err {
        SphereError::ContactNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        SphereError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SphereError::Directory(_) | SphereError::PartialSync { .. } => (StatusCode::BAD_GATEWAY, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

/// GET / - Service banner.
pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "contactsphere",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
