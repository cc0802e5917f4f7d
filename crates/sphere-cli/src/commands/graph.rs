//! Graph schema and insight commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use sphere_core::organization::derive_organizations;
use sphere_core::{ContactStore, GraphQueries, SphereConfig};

use crate::output;

#[derive(Subcommand)]
pub enum GraphCommands {
    /// Create Neo4j constraints and indexes
    Init,

    /// Show graph statistics
    Status,

    /// Shortest relationship chain between two contacts
    Path {
        /// Source contact ID
        source: String,
        /// Target contact ID
        target: String,
    },

    /// Organizations with two or more contacts
    Communities,

    /// Every organization derived from contacts
    Organizations,
}

pub async fn execute(cmd: GraphCommands, config: &SphereConfig) -> Result<()> {
    let store = super::connect_store(config).await?;

    match cmd {
        GraphCommands::Init => {
            sphere_graph::initialize_schema(store.client()).await?;
            println!("{} Schema initialized at {}", "✓".green(), config.graph.uri);
        }
        GraphCommands::Status => {
            let stats = store.graph_statistics().await?;
            println!("{} {}", "Neo4j:".bold(), config.graph.uri.green());
            output::print_statistics(&stats);
        }
        GraphCommands::Path { source, target } => match store.shortest_path(&source, &target).await? {
            Some(path) => output::print_path(&path),
            None => println!("{}", format!("No path between {} and {}.", source, target).dimmed()),
        },
        GraphCommands::Communities => {
            let communities = store.communities().await?;
            output::print_communities(&communities);
        }
        GraphCommands::Organizations => {
            let contacts = store.get_contacts(None).await?;
            output::print_organizations(&derive_organizations(&contacts));
        }
    }

    Ok(())
}
