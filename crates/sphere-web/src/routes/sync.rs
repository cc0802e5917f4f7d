//! Sync trigger.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::info;

use sphere_core::{run_sync, SphereError, SyncReport};

use super::api_error;
use crate::state::AppState;

/// POST /api/sync - Run one sync cycle.
///
/// Rejected with 409 while another sync holds the lock. A sync that stops
/// partway answers 502 with the partial report as JSON.
pub async fn trigger_sync(State(state): State<AppState>) -> Result<Json<SyncReport>, Response> {
    let directory = state.directory.clone().ok_or_else(|| {
        (StatusCode::UNAUTHORIZED, "No directory credentials configured".to_string()).into_response()
    })?;

    let _guard = state
        .sync_lock
        .try_lock()
        .map_err(|_| (StatusCode::CONFLICT, "A sync is already running".to_string()).into_response())?;

    info!("Sync triggered over HTTP");
    let report = run_sync(directory.as_ref(), state.store.as_ref(), &state.engine)
        .await
        .map_err(sync_error)?;

    Ok(Json(report))
}

fn sync_error(err: SphereError) -> Response {
    match err {
        SphereError::PartialSync { report, source } => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "error": source.to_string(),
                "report": report,
            })),
        )
            .into_response(),
        other => api_error(other).into_response(),
    }
}
