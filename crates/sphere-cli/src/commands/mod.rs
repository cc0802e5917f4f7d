//! CLI command definitions and handlers.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use sphere_core::SphereConfig;
use sphere_graph::{GraphClient, Neo4jStore};

pub mod contacts;
pub mod edges;
pub mod graph;
pub mod serve;
pub mod sync;
pub mod tag;

/// ContactSphere - relationship inference over your address book
#[derive(Parser)]
#[command(name = "sphere")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (defaults to ./sphere.toml)
    #[arg(short, long, global = true, env = "SPHERE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull contacts from the directory and rebuild relationships
    Sync(sync::SyncArgs),

    /// Browse contacts
    #[command(subcommand)]
    Contacts(contacts::ContactCommands),

    /// Add or remove contact tags
    #[command(subcommand)]
    Tag(tag::TagCommands),

    /// Replace a contact's notes
    Notes {
        /// Contact ID
        id: String,
        /// New notes text (empty clears them)
        text: String,
    },

    /// List inferred relationships
    Edges(edges::EdgesArgs),

    /// Graph schema and insights
    #[command(subcommand)]
    Graph(graph::GraphCommands),

    /// Start the REST API server
    Serve(serve::ServeArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let config = SphereConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        match self.command {
            Commands::Sync(args) => sync::execute(args, &config).await,
            Commands::Contacts(cmd) => contacts::execute(cmd, &config, self.verbose).await,
            Commands::Tag(cmd) => tag::execute(cmd, &config).await,
            Commands::Notes { id, text } => contacts::set_notes(&config, &id, &text).await,
            Commands::Edges(args) => edges::execute(args, &config).await,
            Commands::Graph(cmd) => graph::execute(cmd, &config).await,
            Commands::Serve(args) => serve::execute(args, &config).await,
        }
    }
}

/// How long to wait for Neo4j to answer the connection ping.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect to Neo4j, failing fast when it is unreachable.
pub async fn connect_store(config: &SphereConfig) -> Result<Neo4jStore> {
    let client = tokio::time::timeout(CONNECT_TIMEOUT, GraphClient::connect(&config.graph))
        .await
        .map_err(|_| anyhow::anyhow!("Timed out connecting to Neo4j at {}", config.graph.uri))??;
    Ok(Neo4jStore::new(client))
}
