//! Tag curation commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use sphere_core::{ContactStore, SphereConfig};

#[derive(Subcommand)]
pub enum TagCommands {
    /// Add a tag to a contact
    Add {
        /// Contact ID
        id: String,
        /// Tag text
        tag: String,
    },

    /// Remove a tag from a contact
    Remove {
        /// Contact ID
        id: String,
        /// Tag text
        tag: String,
    },
}

pub async fn execute(cmd: TagCommands, config: &SphereConfig) -> Result<()> {
    let store = super::connect_store(config).await?;

    let contact = match cmd {
        TagCommands::Add { id, tag } => store.add_tag(&id, &tag).await?,
        TagCommands::Remove { id, tag } => store.remove_tag(&id, &tag).await?,
    };

    let tags: Vec<&str> = contact.tags.iter().map(String::as_str).collect();
    println!(
        "{} {} {}",
        "✓".green(),
        contact.name.bold(),
        if tags.is_empty() { "(no tags)".dimmed().to_string() } else { tags.join(", ").cyan().to_string() }
    );
    Ok(())
}
