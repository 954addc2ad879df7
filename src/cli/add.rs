//! `agrikb add` command
//!
//! Adds a knowledge article, FAQ or practice.
//!
//! # Usage
//! ```bash
//! agrikb add knowledge "Soil pH" "Most crops prefer 6.0-7.0..." --category soil --summary "Soil pH testing guide"
//! agrikb add faq "When to plant maize?" "At the onset of rains." --category crops --tags maize,planting
//! agrikb add practice "Drip irrigation" "Water at the roots" --category water --step "Lay lines" --step "Fit emitters"
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::utils::{open_service, resolve_category};
use crate::config::Config;
use crate::core::entity::{DifficultyLevel, NewFaq, NewKnowledge, NewPractice};

#[derive(Args, Debug)]
pub struct AddArgs {
    #[command(subcommand)]
    pub command: AddCommands,
}

/// Fields shared by every item type
#[derive(Args, Debug)]
pub struct CommonFields {
    /// Category (id, slug or name)
    #[arg(short, long)]
    pub category: String,

    /// Tags (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Keywords used for chatbot matching (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// beginner, intermediate or advanced
    #[arg(long, default_value = "beginner")]
    pub difficulty: DifficultyLevel,

    /// Region the item applies to
    #[arg(long)]
    pub region: Option<String>,

    /// Crop the item applies to
    #[arg(long)]
    pub crop: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum AddCommands {
    /// Add a knowledge article
    Knowledge {
        title: String,

        content: String,

        /// Short summary
        #[arg(short, long, default_value = "")]
        summary: String,

        /// Season the article applies to
        #[arg(long)]
        season: Option<String>,

        #[command(flatten)]
        common: CommonFields,
    },

    /// Add an FAQ
    Faq {
        question: String,

        answer: String,

        #[command(flatten)]
        common: CommonFields,
    },

    /// Add a practice
    Practice {
        name: String,

        description: String,

        /// A step, in order (repeatable)
        #[arg(long = "step")]
        steps: Vec<String>,

        /// A benefit (repeatable)
        #[arg(long = "benefit")]
        benefits: Vec<String>,

        /// A requirement (repeatable)
        #[arg(long = "requirement")]
        requirements: Vec<String>,

        /// Season the practice applies to
        #[arg(long)]
        season: Option<String>,

        #[command(flatten)]
        common: CommonFields,
    },
}

pub async fn run(args: AddArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;

    match args.command {
        AddCommands::Knowledge {
            title,
            content,
            summary,
            season,
            common,
        } => {
            let category_id = resolve_category(&service, &common.category).await?;
            let item = service
                .add_knowledge(NewKnowledge {
                    title,
                    content,
                    summary,
                    category_id,
                    tags: common.tags,
                    keywords: common.keywords,
                    difficulty_level: common.difficulty,
                    region: common.region,
                    crop_type: common.crop,
                    season,
                })
                .await?;
            print_added("knowledge article", &item.id, &item.title);
        }

        AddCommands::Faq {
            question,
            answer,
            common,
        } => {
            let category_id = resolve_category(&service, &common.category).await?;
            let item = service
                .add_faq(NewFaq {
                    question,
                    answer,
                    category_id,
                    tags: common.tags,
                    keywords: common.keywords,
                    region: common.region,
                    crop_type: common.crop,
                    difficulty_level: common.difficulty,
                })
                .await?;
            print_added("FAQ", &item.id, &item.question);
        }

        AddCommands::Practice {
            name,
            description,
            steps,
            benefits,
            requirements,
            season,
            common,
        } => {
            let category_id = resolve_category(&service, &common.category).await?;
            let item = service
                .add_practice(NewPractice {
                    practice_name: name,
                    description,
                    steps,
                    benefits,
                    requirements,
                    category_id,
                    crop_type: common.crop,
                    season,
                    region: common.region,
                    difficulty_level: common.difficulty,
                    tags: common.tags,
                    keywords: common.keywords,
                })
                .await?;
            print_added("practice", &item.id, &item.practice_name);
        }
    }

    Ok(())
}

fn print_added(noun: &str, id: &str, label: &str) {
    println!("{} Added {}: {}", "✓".green(), noun, label.bold());
    println!("  ID: {}", id.cyan());
}
