//! `agrikb manage` command
//!
//! Interactive management screen: switch tabs, search, filter by category
//! and delete items. New items and edits go through `agrikb add` and
//! `agrikb update`.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use dialoguer::{Input, Select};

use super::utils::{open_service, print_failures, render_table, truncate};
use crate::config::Config;
use crate::core::manager::{Confirm, DeleteResult, ManagementView, Tab};
use crate::core::service::DeleteOutcome;

#[derive(Args, Debug)]
pub struct ManageArgs {}

const ACTIONS: &[&str] = &[
    "Switch tab",
    "Search",
    "Filter by category",
    "Delete item",
    "Refresh",
    "Quit",
];

/// Terminal yes/no prompt; any prompt error counts as "no"
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

pub async fn run(_args: ManageArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;
    let mut view = ManagementView::new(&service);
    view.load().await;

    loop {
        render(&view);

        let action = Select::new()
            .with_prompt("Action")
            .items(ACTIONS)
            .default(0)
            .interact()?;

        match action {
            0 => {
                let current = Tab::ALL.iter().position(|t| *t == view.tab()).unwrap_or(0);
                let index = Select::new()
                    .with_prompt("Tab")
                    .items(&Tab::ALL)
                    .default(current)
                    .interact()?;
                view.set_tab(Tab::ALL[index]).await;
            }
            1 => {
                let query: String = Input::new()
                    .with_prompt("Search knowledge base")
                    .with_initial_text(view.search_query())
                    .allow_empty(true)
                    .interact_text()?;
                view.set_search_query(query).await;
            }
            2 => {
                let mut options = vec!["All Categories".to_string()];
                options.extend(view.categories().iter().map(|c| c.name.clone()));
                let current = view
                    .selected_category()
                    .and_then(|id| view.categories().iter().position(|c| c.id == id))
                    .map(|i| i + 1)
                    .unwrap_or(0);

                let index = Select::new()
                    .with_prompt("Category")
                    .items(&options)
                    .default(current)
                    .interact()?;

                let selected = index
                    .checked_sub(1)
                    .and_then(|i| view.categories().get(i))
                    .map(|c| c.id.clone());
                view.set_category(selected).await;
            }
            3 => delete_item(&mut view).await?,
            4 => view.load().await,
            _ => break,
        }
    }

    Ok(())
}

async fn delete_item(view: &mut ManagementView<'_>) -> Result<()> {
    let ids: Vec<String> = view.row_ids().into_iter().map(str::to_string).collect();
    if ids.is_empty() {
        println!("Nothing to delete on this tab.");
        return Ok(());
    }

    let labels: Vec<String> = view
        .rows()
        .into_iter()
        .map(|row| {
            let label = row.get(1).map(String::as_str).unwrap_or_default();
            truncate(label, 60)
        })
        .collect();

    let index = Select::new()
        .with_prompt(format!("Delete from {}", view.tab()))
        .items(&labels)
        .default(0)
        .interact()?;

    match view.delete(&ids[index], &mut TerminalConfirm).await {
        DeleteResult::Cancelled => println!("Cancelled."),
        DeleteResult::Deleted(DeleteOutcome::Deactivated) => println!("🗑️  Deleted."),
        DeleteResult::Deleted(DeleteOutcome::NoMatch) => {
            println!("{} Item was already gone.", "ℹ".blue())
        }
        DeleteResult::Failed(reason) => {
            eprintln!("{} Failed to delete item: {}", "✗".red().bold(), reason);
            let _: String = Input::new()
                .with_prompt("Press Enter to continue")
                .allow_empty(true)
                .interact_text()?;
        }
    }

    Ok(())
}

fn render(view: &ManagementView<'_>) {
    println!("\n{}", "Knowledge Base Management".bold());
    println!("{}", "═".repeat(60));

    let tabs: Vec<String> = Tab::ALL
        .iter()
        .map(|tab| {
            if *tab == view.tab() {
                format!("[{}]", tab).green().bold().to_string()
            } else {
                tab.to_string()
            }
        })
        .collect();
    println!("{}", tabs.join("  "));

    let category = view
        .selected_category()
        .map(|id| view.category_name(id).to_string())
        .unwrap_or_else(|| "All Categories".to_string());
    let query = if view.search_query().is_empty() {
        "(none)".dimmed().to_string()
    } else {
        view.search_query().to_string()
    };
    println!("Search: {} | Category: {}", query, category);

    print_failures(view.failures());

    let rows = view.rows();
    if rows.is_empty() {
        println!("\nNo items.");
        return;
    }

    let rows = rows
        .into_iter()
        .map(|row| row.into_iter().map(|cell| truncate(&cell, 40)).collect())
        .collect();
    println!("{}", render_table(view.tab().headers(), rows));
}
