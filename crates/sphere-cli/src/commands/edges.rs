//! Relationship listing command.

use anyhow::Result;
use clap::Args;

use sphere_core::{ContactStore, RelationshipType, SphereConfig};

use crate::output;

#[derive(Args)]
pub struct EdgesArgs {
    /// Only show one relationship type (colleague, local, country-mate, ...)
    #[arg(short = 't', long = "type")]
    pub relationship_type: Option<RelationshipType>,

    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: EdgesArgs, config: &SphereConfig) -> Result<()> {
    let store = super::connect_store(config).await?;
    let edges = store.get_edges(args.relationship_type).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&edges)?);
        return Ok(());
    }

    let contacts = store.get_contacts(None).await?;
    output::print_edges_table(&edges, &contacts);
    Ok(())
}
