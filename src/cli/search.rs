//! `agrikb search` command
//!
//! Searches knowledge articles, FAQs and practices in one go.
//!
//! # Usage
//! ```bash
//! agrikb search pH
//! agrikb search "drip irrigation" --category water
//! agrikb search                       # Newest items in every collection
//! agrikb search pH --format json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{open_service, print_failures, render_table, resolve_filter_category, truncate};
use crate::config::Config;
use crate::core::service::SearchResults;

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search text (empty lists the newest items)
    #[arg(default_value = "")]
    pub query: String,

    /// Filter by category (id, slug or name)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Output format (pretty, json, compact)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}

pub async fn run(args: SearchArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;

    let category_id = match args.category.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Some(resolve_filter_category(&service, raw).await),
        _ => None,
    };

    let results = service.search(&args.query, category_id.as_deref()).await;

    match args.format.as_str() {
        "json" => print_json(&results)?,
        "compact" => print_compact(&results),
        _ => print_pretty(&results),
    }

    print_failures(&results.failures);
    if results.total() == 0 && !results.is_complete() {
        anyhow::bail!("Search failed");
    }

    Ok(())
}

fn print_pretty(results: &SearchResults) {
    if results.total() == 0 {
        if results.is_complete() {
            println!("No results found.");
        }
        return;
    }

    println!("\n📚 Found {} result(s):", results.total());

    if !results.knowledge.is_empty() {
        println!("\n{} ({})", "Knowledge".bold(), results.knowledge.len());
        let rows = results
            .knowledge
            .iter()
            .map(|k| vec![k.id.clone(), k.title.clone(), truncate(&k.summary, 60)])
            .collect();
        println!("{}", render_table(&["ID", "Title", "Summary"], rows));
    }

    if !results.faqs.is_empty() {
        println!("\n{} ({})", "FAQs".bold(), results.faqs.len());
        let rows = results
            .faqs
            .iter()
            .map(|f| vec![f.id.clone(), f.question.clone(), truncate(&f.answer, 60)])
            .collect();
        println!("{}", render_table(&["ID", "Question", "Answer"], rows));
    }

    if !results.practices.is_empty() {
        println!("\n{} ({})", "Practices".bold(), results.practices.len());
        let rows = results
            .practices
            .iter()
            .map(|p| vec![p.id.clone(), p.practice_name.clone(), truncate(&p.description, 60)])
            .collect();
        println!("{}", render_table(&["ID", "Practice", "Description"], rows));
    }
}

fn print_compact(results: &SearchResults) {
    for k in &results.knowledge {
        println!("knowledge\t{}\t{}", k.id, k.title);
    }
    for f in &results.faqs {
        println!("faq\t{}\t{}", f.id, f.question);
    }
    for p in &results.practices {
        println!("practice\t{}\t{}", p.id, p.practice_name);
    }
}

fn print_json(results: &SearchResults) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    println!("{}", json);
    Ok(())
}
