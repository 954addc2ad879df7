//! `agrikb delete` command
//!
//! Soft deletes an item: it stays in the database with `is_active = false`
//! and no longer shows up in searches.
//!
//! # Usage
//! ```bash
//! agrikb delete faq 01HQ3K2JN5...          # Asks for confirmation
//! agrikb delete knowledge 01HQ3K2JN5... -y  # No prompt
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::Confirm;

use super::utils::open_service;
use crate::config::Config;
use crate::core::collection::Collection;
use crate::core::manager::DELETE_PROMPT;
use crate::core::service::DeleteOutcome;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Item type: knowledge, faq or practice
    pub kind: Collection,

    /// Item ID
    pub id: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

pub async fn run(args: DeleteArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;

    if !args.yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("{} ({} {})", DELETE_PROMPT, args.kind.noun(), args.id))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    match service.soft_delete(args.kind, &args.id).await {
        Ok(DeleteOutcome::Deactivated) => {
            println!("🗑️  Deleted {} {}", args.kind.noun(), args.id.cyan());
        }
        Ok(DeleteOutcome::NoMatch) => {
            println!(
                "{} No {} with ID {}; nothing changed.",
                "ℹ".blue(),
                args.kind.noun(),
                args.id
            );
        }
        Err(e) => {
            anyhow::bail!("Failed to delete {} {}: {}", args.kind.noun(), args.id, e);
        }
    }

    Ok(())
}
