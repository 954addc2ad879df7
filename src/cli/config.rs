//! `agrikb config` command
//!
//! Get or set configuration values.
//!
//! # Usage
//! ```bash
//! agrikb config                          # Show all config
//! agrikb config store.backend            # Get specific value
//! agrikb config store.backend remote     # Set value
//! agrikb config --path                   # Show config file locations
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::config::{Config, CONFIG_DIR};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Config key (e.g., store.backend, search.per_collection_limit)
    pub key: Option<String>,

    /// Value to set
    pub value: Option<String>,

    /// List all config values
    #[arg(long)]
    pub list: bool,

    /// Edit config file in $EDITOR
    #[arg(short, long)]
    pub edit: bool,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Use global config (~/.agrikb/config.toml) instead of local
    #[arg(short, long)]
    pub global: bool,
}

fn get_config_path(global: bool) -> PathBuf {
    if global {
        Config::global_config_path().unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("config.toml"))
    } else {
        Config::find_local_config().unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("config.toml"))
    }
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let config_path = get_config_path(args.global);

    if args.path {
        println!("Global: {}", get_config_path(true).display());
        println!("Local:  {}", get_config_path(false).display());
        println!();
        if config_path.exists() {
            println!("✓ Active: {}", config_path.display());
        } else {
            println!("⚠ No config file found at {}", config_path.display());
        }
        return Ok(());
    }

    if args.edit {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

        if !config_path.exists() {
            Config::default().save_to(&config_path)?;
            println!("Created {}", config_path.display());
        }

        std::process::Command::new(&editor)
            .arg(&config_path)
            .status()
            .with_context(|| format!("Failed to open editor: {}", editor))?;
        return Ok(());
    }

    if args.list || (args.key.is_none() && args.value.is_none()) {
        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            println!("📋 Configuration ({}):\n", config_path.display());
            println!("{}", content);
        } else {
            println!("📋 No config file at {}", config_path.display());
            println!();
            println!("Create one with:");
            println!("  agrikb init");
            println!("  agrikb config store.backend remote");
        }
        return Ok(());
    }

    if let Some(key) = &args.key {
        if let Some(value) = &args.value {
            set_config_value(&config_path, key, value)?;
            println!("✅ Set {} = {} (in {})", key, value, config_path.display());
        } else {
            match get_config_value(&config_path, key)? {
                Some(v) => println!("{}", v),
                None => println!("(not set)"),
            }
        }
    }

    Ok(())
}

/// Set a nested config value using dot notation (e.g., "store.url")
///
/// The edited document must still load as a `Config`, so typos in enum
/// values or numbers are rejected before anything is written.
fn set_config_value(path: &Path, key: &str, val: &str) -> Result<()> {
    use toml_edit::{value, DocumentMut};

    let content = if path.exists() {
        fs::read_to_string(path)?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content.parse().context("Failed to parse config.toml")?;

    let parts: Vec<&str> = key.split('.').collect();
    match parts.as_slice() {
        [section, field] => {
            if doc.get(section).is_none() {
                doc[*section] = toml_edit::table();
            }
            doc[*section][*field] = value(parse_toml_value(val));
        }
        _ => anyhow::bail!("Invalid key: {}. Use section.key (e.g., store.url)", key),
    }

    let updated = doc.to_string();
    toml::from_str::<Config>(&updated)
        .with_context(|| format!("Invalid value for {}: {}", key, val))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, updated)?;
    Ok(())
}

/// Get a config value by dot notation key
fn get_config_value(path: &Path, key: &str) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let doc: toml::Value = content.parse().context("Failed to parse config.toml")?;

    let val = match key.split('.').collect::<Vec<_>>().as_slice() {
        [top] => doc.get(top),
        [section, field] => doc.get(section).and_then(|t| t.get(field)),
        _ => None,
    };

    Ok(val.map(|v| match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }))
}

/// Parse string value to appropriate TOML type
fn parse_toml_value(s: &str) -> toml_edit::Value {
    if let Ok(b) = s.parse::<bool>() {
        return b.into();
    }

    if let Ok(i) = s.parse::<i64>() {
        return i.into();
    }

    if let Ok(f) = s.parse::<f64>() {
        return f.into();
    }

    s.into()
}
