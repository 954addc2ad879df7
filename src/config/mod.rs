//! Configuration module

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Directory holding config and database, locally or in the home dir
pub const CONFIG_DIR: &str = ".agrikb";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,

    #[serde(default)]
    pub context: ContextConfig,
}

/// Which backend serves the collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    Remote,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Remote => write!(f, "remote"),
        }
    }
}

/// Store backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,

    /// SQLite database file (overrides the discovered location)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Data service URL (e.g., "https://project.example.co")
    #[serde(default)]
    pub url: Option<String>,

    /// Data service API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            url: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl StoreConfig {
    /// API key with AGRIKB_API_KEY taking priority over the file
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var("AGRIKB_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.api_key.clone())
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Rows returned per collection
    #[serde(default = "default_per_collection_limit")]
    pub per_collection_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_collection_limit: default_per_collection_limit(),
        }
    }
}

fn default_per_collection_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_activity_limit: default_recent_activity_limit(),
        }
    }
}

fn default_recent_activity_limit() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Candidate rows fetched per collection
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Items kept per collection after scoring
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Items must score strictly above this
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            candidate_limit: default_candidate_limit(),
            top_k: default_top_k(),
            min_score: default_min_score(),
        }
    }
}

fn default_candidate_limit() -> usize {
    5
}

fn default_top_k() -> usize {
    3
}

fn default_min_score() -> f64 {
    0.1
}

impl Config {
    /// Load config from default locations
    ///
    /// Priority: AGRIKB_CONFIG, local `.agrikb/config.toml`, global
    /// `~/.agrikb/config.toml`, defaults.
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var("AGRIKB_CONFIG") {
            return Self::load_from(Path::new(&explicit));
        }

        if let Some(local) = Self::find_local_config() {
            return Self::load_from(&local);
        }

        if let Some(global) = Self::global_config_path() {
            if global.exists() {
                return Self::load_from(&global);
            }
        }

        Ok(Self::default())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Find local .agrikb/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        Self::find_upwards("config.toml")
    }

    /// Find local .agrikb/data.db walking up directories
    pub fn find_local_db() -> Option<PathBuf> {
        Self::find_upwards("data.db")
    }

    fn find_upwards(file: &str) -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let candidate = current.join(CONFIG_DIR).join(file);
            if candidate.exists() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config directory (~/.agrikb)
    pub fn global_dir() -> Option<PathBuf> {
        directories::UserDirs::new().map(|dirs| dirs.home_dir().join(CONFIG_DIR))
    }

    /// Get global config path (~/.agrikb/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|d| d.join("config.toml"))
    }

    /// Get global database path (~/.agrikb/data.db)
    pub fn global_db_path() -> Option<PathBuf> {
        Self::global_dir().map(|d| d.join("data.db"))
    }

    /// Get the SQLite database path with priority:
    /// 1. AGRIKB_DATABASE env var
    /// 2. store.path from config
    /// 3. Local .agrikb/data.db (walking up from CWD)
    /// 4. Global ~/.agrikb/data.db
    pub fn data_dir(&self) -> PathBuf {
        if let Ok(env_path) = std::env::var("AGRIKB_DATABASE") {
            return PathBuf::from(env_path);
        }

        if let Some(ref path) = self.store.path {
            return path.clone();
        }

        if let Some(local_db) = Self::find_local_db() {
            return local_db;
        }

        // Local .agrikb/ directory exists (even without data.db yet)
        if let Some(dir) = Self::find_local_config().as_deref().and_then(Path::parent) {
            return dir.join("data.db");
        }

        if let Some(global) = Self::global_db_path() {
            return global;
        }

        PathBuf::from(CONFIG_DIR).join("data.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.store.backend, BackendKind::Sqlite);
        assert_eq!(config.store.timeout_secs, 30);
        assert_eq!(config.search.per_collection_limit, 10);
        assert_eq!(config.analytics.recent_activity_limit, 10);
        assert_eq!(config.context.candidate_limit, 5);
        assert_eq!(config.context.top_k, 3);
        assert!((config.context.min_score - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
            [store]
            backend = "remote"
            url = "https://project.example.co"

            [search]
            per_collection_limit = 25
            "#,
        )?;

        assert_eq!(config.store.backend, BackendKind::Remote);
        assert_eq!(config.store.url.as_deref(), Some("https://project.example.co"));
        assert_eq!(config.store.timeout_secs, 30);
        assert_eq!(config.search.per_collection_limit, 25);
        assert_eq!(config.context.top_k, 3);
        Ok(())
    }

    #[test]
    fn test_save_and_load_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(CONFIG_DIR).join("config.toml");

        let mut config = Config::default();
        config.store.path = Some(dir.path().join("kb.db"));
        config.context.min_score = 0.25;
        config.save_to(&path)?;

        let loaded = Config::load_from(&path)?;
        assert_eq!(loaded.store.path, config.store.path);
        assert!((loaded.context.min_score - 0.25).abs() < f64::EPSILON);
        Ok(())
    }

    #[test]
    fn test_invalid_backend_is_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[store]\nbackend = \"mongo\"");
        assert!(result.is_err());
    }
}
