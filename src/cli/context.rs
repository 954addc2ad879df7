//! `agrikb context` command
//!
//! Finds the items most relevant to a question and prints them as the
//! prompt block a chatbot would receive.
//!
//! # Usage
//! ```bash
//! agrikb context "How do I stop tomato blight?"
//! agrikb context "When to plant maize?" --log
//! agrikb context "soil acidity" --json
//! ```

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::{open_service, print_failures};
use crate::config::Config;
use crate::core::context::{extract_keywords, format_for_prompt};
use crate::core::entity::NewChatContext;

#[derive(Args, Debug)]
pub struct ContextArgs {
    /// The user's question
    pub query: String,

    /// Record this lookup in the chat context log
    #[arg(long)]
    pub log: bool,

    /// Response text to store with the log entry
    #[arg(long, requires = "log")]
    pub response: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ContextArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;
    let context = service.relevant_context(&args.query).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&context)?);
    } else if context.is_empty() {
        let keywords = extract_keywords(&args.query);
        if keywords.is_empty() {
            println!("No keywords found in the question.");
        } else {
            println!("No relevant knowledge for: {}", keywords.join(", "));
        }
    } else {
        println!(
            "{} {:.2} | categories: {}",
            "Confidence:".bold(),
            context.confidence_score,
            context.matched_categories.join(", ")
        );
        print!("{}", format_for_prompt(&context));
    }

    print_failures(&context.failures);

    if args.log {
        let entry = service
            .log_context_usage(NewChatContext {
                user_query: args.query.clone(),
                context_used: context.item_ids(),
                response_generated: args.response.unwrap_or_default(),
                category_matched: context.matched_categories.first().cloned(),
                confidence_score: context.confidence_score,
            })
            .await?;
        eprintln!("📝 Logged context usage ({})", entry.id);
    }

    Ok(())
}
