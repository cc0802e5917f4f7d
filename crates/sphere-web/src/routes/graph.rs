//! Relationship and graph-insight handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use sphere_core::insights::{Community, ContactPath, GraphStatistics};
use sphere_core::organization::derive_organizations;
use sphere_core::{ContactStore, GraphQueries, OrganizationNode, RelationshipEdge, RelationshipType};

use super::{api_error, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EdgeParams {
    #[serde(rename = "type")]
    pub relationship_type: Option<String>,
}

pub async fn list_edges(
    State(state): State<AppState>,
    Query(params): Query<EdgeParams>,
) -> Result<Json<Vec<RelationshipEdge>>, ApiError> {
    let relationship_type = params
        .relationship_type
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(str::parse::<RelationshipType>)
        .transpose()
        .map_err(api_error)?;

    let edges = state.store.get_edges(relationship_type).await.map_err(api_error)?;
    Ok(Json(edges))
}

pub async fn list_organizations(State(state): State<AppState>) -> Result<Json<Vec<OrganizationNode>>, ApiError> {
    let contacts = state.store.get_contacts(None).await.map_err(api_error)?;
    Ok(Json(derive_organizations(&contacts)))
}

pub async fn get_statistics(State(state): State<AppState>) -> Result<Json<GraphStatistics>, ApiError> {
    let stats = state.store.graph_statistics().await.map_err(api_error)?;
    Ok(Json(stats))
}

pub async fn get_shortest_path(
    State(state): State<AppState>,
    Path((source, target)): Path<(String, String)>,
) -> Result<Json<ContactPath>, ApiError> {
    let path = state
        .store
        .shortest_path(&source, &target)
        .await
        .map_err(api_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                format!("No path between {} and {}", source, target),
            )
        })?;
    Ok(Json(path))
}

pub async fn list_communities(State(state): State<AppState>) -> Result<Json<Vec<Community>>, ApiError> {
    let communities = state.store.communities().await.map_err(api_error)?;
    Ok(Json(communities))
}
