//! Directory sync command.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tracing::{info, warn};

use sphere_core::{run_sync, InferenceEngine, SphereConfig, SphereError};
use sphere_people::PeopleClient;

use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: SyncArgs, config: &SphereConfig) -> Result<()> {
    let directory = PeopleClient::from_config(&config.directory)?.ok_or_else(|| {
        anyhow::anyhow!("No directory access token. Set GOOGLE_ACCESS_TOKEN or directory.access_token.")
    })?;
    let store = super::connect_store(config).await?;
    sphere_graph::initialize_schema(store.client()).await?;
    let engine = InferenceEngine::new(config.inference.clone());

    if !args.json {
        println!("{}", "Syncing contacts...".bold());
    }

    match run_sync(&directory, &store, &engine).await {
        Ok(report) => {
            info!(
                imported = report.imported,
                updated = report.updated,
                edges = report.edges,
                "Sync finished"
            );
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n{}", "Sync complete:".green().bold());
                output::print_sync_report(&report);
            }
            Ok(())
        }
        Err(SphereError::PartialSync { report, source }) => {
            warn!(error = %source, pages = report.pages, "Sync stopped early");
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("\n{}", "Sync stopped early; committed pages were kept:".yellow().bold());
                output::print_sync_report(&report);
            }
            Err(anyhow::anyhow!("Sync incomplete: {}", source))
        }
        Err(e) => Err(e.into()),
    }
}
