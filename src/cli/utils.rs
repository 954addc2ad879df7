//! CLI utility functions
//!
//! Common helpers shared across commands:
//! - Config loading and service construction
//! - Category lookup by id, slug or name
//! - Table rendering and failure warnings

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::config::Config;
use crate::core::entity::Category;
use crate::core::error::QueryFailure;
use crate::core::service::{KnowledgeService, ServiceSettings};
use crate::core::store::open_store;

/// Load config from an explicit path or the default locations
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(p) => Config::load_from(Path::new(p)),
        None => Config::load(),
    }
}

/// Open the configured store and wrap it in the service
pub fn open_service(config: &Config) -> Result<KnowledgeService> {
    let store = open_store(config).context("Failed to open knowledge store")?;
    Ok(KnowledgeService::new(store, ServiceSettings::from(config)))
}

/// Resolve a category given by id, slug or name (case-insensitive)
///
/// Unknown values pass through unchanged; category ids are not validated.
pub async fn resolve_category(service: &KnowledgeService, raw: &str) -> Result<String> {
    let categories = service.list_categories().await?;
    Ok(match_category(&categories, raw))
}

/// Like [`resolve_category`], but a failed category lookup falls back to the
/// raw value with a warning instead of failing the command
pub async fn resolve_filter_category(service: &KnowledgeService, raw: &str) -> String {
    match service.list_categories().await {
        Ok(categories) => match_category(&categories, raw),
        Err(e) => {
            eprintln!(
                "{} could not load categories ({}); filtering by {:?} as an id",
                "⚠".yellow(),
                e,
                raw.trim()
            );
            raw.trim().to_string()
        }
    }
}

fn match_category(categories: &[Category], raw: &str) -> String {
    let raw = raw.trim();
    let found = categories
        .iter()
        .find(|c| c.id == raw)
        .or_else(|| categories.iter().find(|c| c.slug == raw))
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(raw)));

    match found {
        Some(category) => category.id.clone(),
        None => {
            tracing::debug!(category = raw, "no matching category; using value as id");
            raw.to_string()
        }
    }
}

/// Render rows as a rounded table
pub fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Warn about sub-queries that failed, so empty tables aren't mistaken for no data
pub fn print_failures(failures: &[QueryFailure]) {
    for failure in failures {
        eprintln!(
            "{} could not load {}: {}",
            "⚠".yellow(),
            failure.source.bold(),
            failure.reason
        );
    }
}

/// Shorten text for a table cell
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    short.push('…');
    short
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::core::entity::NewCategory;
    use crate::core::store::{LocalStore, RemoteStore};
    use crate::remote::DataApiClient;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 8), "a longe…");
    }

    #[test]
    fn test_render_table_has_headers_and_cells() {
        let table = render_table(&["ID", "Title"], vec![vec!["k1".to_string(), "Mulch".to_string()]]);
        assert!(table.contains("ID"));
        assert!(table.contains("Mulch"));
    }

    #[tokio::test]
    async fn test_resolve_category() -> Result<()> {
        let store = LocalStore::in_memory()?;
        let service = KnowledgeService::new(Arc::new(store), ServiceSettings::default());
        let soil = service.add_category(NewCategory::new("Soil Health")).await?;

        assert_eq!(resolve_category(&service, "soil-health").await?, soil.id);
        assert_eq!(resolve_category(&service, "soil health").await?, soil.id);
        assert_eq!(resolve_category(&service, &soil.id).await?, soil.id);
        assert_eq!(resolve_category(&service, "orchards").await?, "orchards");
        assert_eq!(resolve_filter_category(&service, " Soil Health ").await, soil.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_filter_category_survives_lookup_failure() -> Result<()> {
        // Nothing listens on the discard port, so every request fails
        let client = DataApiClient::new("http://127.0.0.1:9", None, 2)?;
        let service = KnowledgeService::new(Arc::new(RemoteStore::new(client)), ServiceSettings::default());

        assert!(resolve_category(&service, "soil").await.is_err());
        assert_eq!(resolve_filter_category(&service, " soil ").await, "soil");
        Ok(())
    }
}
