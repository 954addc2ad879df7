//! CLI module - Command definitions and handlers

use clap::{Parser, Subcommand};

pub mod add;
pub mod analytics;
pub mod categories;
pub mod config;
pub mod context;
pub mod delete;
pub mod init;
pub mod manage;
pub mod search;
pub mod update;
pub mod usage;
pub mod utils;

/// agrikb - Agricultural knowledge base
///
/// Manage knowledge articles, FAQs and practices stored locally in SQLite
/// or in a hosted data service.
#[derive(Parser, Debug)]
#[command(name = "agrikb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(long, global = true, env = "AGRIKB_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new agrikb directory
    Init(init::InitArgs),

    /// Get or set configuration
    Config(config::ConfigArgs),

    /// List or add categories
    Categories(categories::CategoriesArgs),

    /// Add a knowledge article, FAQ or practice
    Add(add::AddArgs),

    /// Update fields of an existing item
    Update(update::UpdateArgs),

    /// Soft delete an item (marks it inactive)
    Delete(delete::DeleteArgs),

    /// Search all collections
    Search(search::SearchArgs),

    /// Show counts and recent activity
    Analytics(analytics::AnalyticsArgs),

    /// Find knowledge relevant to a question
    Context(context::ContextArgs),

    /// Record that an FAQ answered a question
    FaqUsed(usage::FaqUsedArgs),

    /// Interactive management screen
    Manage(manage::ManageArgs),
}
