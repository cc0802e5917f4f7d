//! Contact browsing commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use sphere_core::{ContactStore, SphereConfig};

use crate::output;

#[derive(Subcommand)]
pub enum ContactCommands {
    /// List contacts
    List {
        /// Case-insensitive substring filter
        #[arg(short, long)]
        search: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one contact
    Show {
        /// Contact ID
        id: String,
    },

    /// List contacts without any relationship signal
    Uncategorized,

    /// Delete a contact and its relationships
    Delete {
        /// Contact ID
        id: String,
    },
}

pub async fn execute(cmd: ContactCommands, config: &SphereConfig, verbose: bool) -> Result<()> {
    let store = super::connect_store(config).await?;

    match cmd {
        ContactCommands::List { search, json } => {
            let contacts = store.get_contacts(search.as_deref()).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&contacts)?);
            } else {
                output::print_contacts_table(&contacts);
            }
        }
        ContactCommands::Show { id } => {
            let contact = store
                .get_contact(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Contact not found: {}", id))?;
            output::print_contact(&contact, verbose);
        }
        ContactCommands::Uncategorized => {
            let contacts = store.get_uncategorized_contacts().await?;
            output::print_contacts_table(&contacts);
        }
        ContactCommands::Delete { id } => {
            if store.delete_contact(&id).await? {
                println!("{} Deleted {}", "✓".green(), id);
            } else {
                anyhow::bail!("Contact not found: {}", id);
            }
        }
    }

    Ok(())
}

pub async fn set_notes(config: &SphereConfig, id: &str, text: &str) -> Result<()> {
    let store = super::connect_store(config).await?;
    let contact = store.update_notes(id, text).await?;
    println!("{} Notes updated for {}", "✓".green(), contact.name.bold());
    Ok(())
}
