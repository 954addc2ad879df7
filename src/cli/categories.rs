//! `agrikb categories` command
//!
//! # Usage
//! ```bash
//! agrikb categories list                         # Tree view
//! agrikb categories list --json
//! agrikb categories add "Soil Health" -d "Testing and fertility"
//! agrikb categories add "Soil Testing" --parent soil-health
//! ```

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::utils::{open_service, resolve_category};
use crate::config::Config;
use crate::core::entity::{slugify, Category, NewCategory};

#[derive(Args, Debug)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommands,
}

#[derive(Subcommand, Debug)]
pub enum CategoriesCommands {
    /// List categories as a tree
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a category
    Add {
        /// Display name
        name: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// URL-friendly slug (default: derived from the name)
        #[arg(long)]
        slug: Option<String>,

        /// Parent category (id, slug or name)
        #[arg(short, long)]
        parent: Option<String>,
    },
}

pub async fn run(args: CategoriesArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;

    match args.command {
        CategoriesCommands::List { json } => {
            let categories = service.list_categories().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
                return Ok(());
            }

            if categories.is_empty() {
                println!("No categories yet.");
                println!("\nCreate one with: agrikb categories add <name>");
                return Ok(());
            }

            println!("{}", "Categories".bold());
            for line in tree_lines(&categories) {
                println!("{}", line);
            }
            println!("\n{} categor{}", categories.len(), if categories.len() == 1 { "y" } else { "ies" });
        }

        CategoriesCommands::Add {
            name,
            description,
            slug,
            parent,
        } => {
            let parent_id = match parent {
                Some(p) => Some(resolve_category(&service, &p).await?),
                None => None,
            };

            let mut category = NewCategory::new(name);
            category.description = description;
            category.parent_id = parent_id;
            if let Some(slug) = slug {
                category.slug = slugify(&slug);
            }
            if category.slug.is_empty() {
                anyhow::bail!("Category name must contain at least one letter or digit");
            }

            let created = service.add_category(category).await?;
            println!(
                "{} Added category: {} ({})",
                "✓".green(),
                created.name.cyan().bold(),
                created.slug
            );
            println!("  ID: {}", created.id.dimmed());
        }
    }

    Ok(())
}

/// Indented tree lines, roots and siblings in name order
///
/// Categories whose parent is missing are shown as roots. A parent chain
/// that loops back on itself is cut at the repeated node.
fn tree_lines(categories: &[Category]) -> Vec<String> {
    let ids: HashSet<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&Category>> = HashMap::new();
    let mut roots = Vec::new();

    for category in categories {
        match category.parent_id.as_deref() {
            Some(parent) if ids.contains(parent) && parent != category.id => {
                children.entry(parent).or_default().push(category)
            }
            _ => roots.push(category),
        }
    }

    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    for root in roots {
        push_subtree(root, 0, &children, &mut visited, &mut lines);
    }

    // Nodes only reachable through a cycle never hang off a root
    for category in categories {
        if !visited.contains(category.id.as_str()) {
            push_subtree(category, 0, &children, &mut visited, &mut lines);
        }
    }

    lines
}

fn push_subtree<'a>(
    category: &'a Category,
    depth: usize,
    children: &HashMap<&str, Vec<&'a Category>>,
    visited: &mut HashSet<&'a str>,
    lines: &mut Vec<String>,
) {
    if !visited.insert(category.id.as_str()) {
        return;
    }

    let indent = "  ".repeat(depth);
    let description = if category.description.is_empty() {
        String::new()
    } else {
        format!(" - {}", category.description)
    };
    lines.push(format!("{}• {} [{}]{}", indent, category.name, category.slug, description));

    if let Some(kids) = children.get(category.id.as_str()) {
        for child in kids {
            push_subtree(child, depth + 1, children, visited, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str, name: &str, parent: Option<&str>) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            slug: slugify(name),
            parent_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn test_tree_nests_children() {
        let categories = vec![
            category("1", "Pests", None),
            category("2", "Soil", None),
            category("3", "Soil Testing", Some("2")),
            category("4", "Orphan", Some("missing")),
        ];

        let lines = tree_lines(&categories);
        assert_eq!(
            lines,
            vec![
                "• Pests [pests]",
                "• Soil [soil]",
                "  • Soil Testing [soil-testing]",
                "• Orphan [orphan]",
            ]
        );
    }

    #[test]
    fn test_tree_survives_cycles() {
        let categories = vec![
            category("a", "Alpha", Some("b")),
            category("b", "Beta", Some("a")),
            category("c", "Self", Some("c")),
        ];

        let lines = tree_lines(&categories);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().any(|l| l.contains("Self")));
    }
}
