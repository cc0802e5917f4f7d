//! ContactSphere Web Server
//!
//! Axum-based REST API over the contact graph.

pub mod routes;
pub mod state;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Sync
        .route("/sync", post(routes::sync::trigger_sync))
        // Contacts
        .route("/contacts", get(routes::contacts::list_contacts))
        .route("/contacts/uncategorized", get(routes::contacts::list_uncategorized))
        .route("/contacts/{id}", get(routes::contacts::get_contact))
        .route("/contacts/{id}", delete(routes::contacts::delete_contact))
        .route("/contacts/{id}/tags", post(routes::contacts::add_tag))
        .route("/contacts/{id}/tags/{tag}", delete(routes::contacts::remove_tag))
        .route("/contacts/{id}/notes", put(routes::contacts::update_notes))
        // Relationships
        .route("/edges", get(routes::graph::list_edges))
        .route("/organizations", get(routes::graph::list_organizations))
        .route("/graph/stats", get(routes::graph::get_statistics))
        .route("/graph/path/{source}/{target}", get(routes::graph::get_shortest_path))
        .route("/graph/communities", get(routes::graph::list_communities))
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::index))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    tracing::info!("Web server listening on http://{}:{}", host, port);

    axum::serve(listener, app).await?;
    Ok(())
}
