//! `agrikb init` command
//!
//! Creates a `.agrikb` directory with a config file and an empty database.
//!
//! # Usage
//! ```bash
//! agrikb init                    # Initialize in current directory
//! agrikb init /path/to/project   # Initialize in specific path
//! agrikb init --global           # Initialize global ~/.agrikb
//! ```

use anyhow::{bail, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

use crate::config::{Config, CONFIG_DIR};
use crate::core::storage::Storage;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path to initialize (default: current directory)
    pub path: Option<PathBuf>,

    /// Initialize global config (~/.agrikb)
    #[arg(long)]
    pub global: bool,

    /// Force re-initialization
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let base_path = if args.global {
        directories::UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    } else {
        args.path.unwrap_or_else(|| PathBuf::from("."))
    };

    let agrikb_dir = base_path.join(CONFIG_DIR);

    if agrikb_dir.exists() && !args.force {
        bail!(
            "Directory {} is already initialized. Use --force to reinitialize.",
            base_path.display()
        );
    }

    println!("🚀 Initializing agrikb in: {}", base_path.display());

    fs::create_dir_all(&agrikb_dir)?;

    let config_path = agrikb_dir.join("config.toml");
    Config::default().save_to(&config_path)?;

    // Opening storage creates the schema
    let db_path = agrikb_dir.join("data.db");
    Storage::open(&db_path)?;

    println!("\n✅ Initialized agrikb");
    println!("   Config: {}", config_path.display());
    println!("   Database: {}", db_path.display());
    println!("\nNext steps:");
    println!("  agrikb categories add \"Soil Health\"");
    println!("  agrikb add faq \"When should I test soil pH?\" \"Before planting.\" --category soil-health");
    println!("  agrikb search pH");

    Ok(())
}
