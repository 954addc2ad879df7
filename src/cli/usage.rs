//! `agrikb faq-used` command
//!
//! Bumps an FAQ's usage counter after it answered a question.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::utils::open_service;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FaqUsedArgs {
    /// FAQ ID
    pub id: String,
}

pub async fn run(args: FaqUsedArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;
    let faq = service.record_faq_usage(&args.id).await?;

    println!(
        "{} {} (used {} time{})",
        "✓".green(),
        faq.question.bold(),
        faq.usage_count,
        if faq.usage_count == 1 { "" } else { "s" }
    );

    Ok(())
}
