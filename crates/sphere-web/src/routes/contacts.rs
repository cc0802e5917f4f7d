//! Contact route handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use sphere_core::{Contact, ContactStore};

use super::{api_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct TagRequest {
    pub tag: String,
}

#[derive(Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state
        .store
        .get_contacts(params.search.as_deref())
        .await
        .map_err(api_error)?;
    Ok(Json(contacts))
}

pub async fn list_uncategorized(State(state): State<AppState>) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = state.store.get_uncategorized_contacts().await.map_err(api_error)?;
    Ok(Json(contacts))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state
        .store
        .get_contact(&id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Contact not found: {}", id)))?;
    Ok(Json(contact))
}

pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_contact(&id).await.map_err(api_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("Contact not found: {}", id)))
    }
}

pub async fn add_tag(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TagRequest>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state.store.add_tag(&id, &req.tag).await.map_err(api_error)?;
    Ok(Json(contact))
}

pub async fn remove_tag(
    State(state): State<AppState>,
    Path((id, tag)): Path<(String, String)>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state.store.remove_tag(&id, &tag).await.map_err(api_error)?;
    Ok(Json(contact))
}

pub async fn update_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<Contact>, ApiError> {
    let contact = state.store.update_notes(&id, &req.notes).await.map_err(api_error)?;
    Ok(Json(contact))
}
