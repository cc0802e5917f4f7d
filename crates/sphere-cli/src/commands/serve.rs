//! Web server command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::info;

use sphere_core::{DirectoryClient, InferenceEngine, SphereConfig};
use sphere_people::PeopleClient;
use sphere_web::AppState;

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on (defaults to server.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to bind to (defaults to server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Also write logs to a file
    #[arg(long)]
    pub log: bool,

    /// Log file path (with --log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs, config: &SphereConfig) -> Result<()> {
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);

    let store = super::connect_store(config).await?;
    sphere_graph::initialize_schema(store.client()).await?;

    let directory =
        PeopleClient::from_config(&config.directory)?.map(|c| Arc::new(c) as Arc<dyn DirectoryClient>);
    let has_directory = directory.is_some();
    let state = AppState::new(
        Arc::new(store),
        directory,
        InferenceEngine::new(config.inference.clone()),
    );

    println!();
    println!("  {} {}", "ContactSphere".cyan().bold(), "API Server".bold());
    println!();
    println!("  {}       http://{}:{}/api", "API".green(), host, port);
    println!("  {}     {}", "Neo4j".green(), config.graph.uri);
    if !has_directory {
        println!("  {}", "No directory token: POST /api/sync will return 401".yellow());
    }
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    info!(host = %host, port, directory = has_directory, "Starting API server");
    sphere_web::run_server(state, &host, port).await?;

    Ok(())
}
