//! `agrikb update` command
//!
//! Changes only the fields given on the command line.
//!
//! # Usage
//! ```bash
//! agrikb update knowledge <id> --summary "Revised summary"
//! agrikb update faq <id> --answer "Twice a week in dry spells." --tags watering
//! agrikb update practice <id> --step "Plan" --step "Plant"
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::utils::{open_service, resolve_category};
use crate::config::Config;
use crate::core::entity::{DifficultyLevel, FaqUpdate, KnowledgeUpdate, PracticeUpdate};
use crate::core::service::KnowledgeService;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(subcommand)]
    pub command: UpdateCommands,
}

/// Optional fields shared by every item type
#[derive(Args, Debug)]
pub struct CommonUpdates {
    /// New category (id, slug or name)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Replace tags (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Replace keywords (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Option<Vec<String>>,

    #[arg(long)]
    pub difficulty: Option<DifficultyLevel>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long)]
    pub crop: Option<String>,
}

impl CommonUpdates {
    fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.tags.is_none()
            && self.keywords.is_none()
            && self.difficulty.is_none()
            && self.region.is_none()
            && self.crop.is_none()
    }

    async fn category_id(&self, service: &KnowledgeService) -> Result<Option<String>> {
        match &self.category {
            Some(raw) => Ok(Some(resolve_category(service, raw).await?)),
            None => Ok(None),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum UpdateCommands {
    /// Update a knowledge article
    Knowledge {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,

        #[arg(short, long)]
        summary: Option<String>,

        #[arg(long)]
        season: Option<String>,

        #[command(flatten)]
        common: CommonUpdates,
    },

    /// Update an FAQ
    Faq {
        id: String,

        #[arg(long)]
        question: Option<String>,

        #[arg(long)]
        answer: Option<String>,

        #[command(flatten)]
        common: CommonUpdates,
    },

    /// Update a practice
    Practice {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replace steps (repeatable, in order)
        #[arg(long = "step")]
        steps: Option<Vec<String>>,

        /// Replace benefits (repeatable)
        #[arg(long = "benefit")]
        benefits: Option<Vec<String>>,

        /// Replace requirements (repeatable)
        #[arg(long = "requirement")]
        requirements: Option<Vec<String>>,

        #[arg(long)]
        season: Option<String>,

        #[command(flatten)]
        common: CommonUpdates,
    },
}

pub async fn run(args: UpdateArgs, config: &Config) -> Result<()> {
    let service = open_service(config)?;

    match args.command {
        UpdateCommands::Knowledge {
            id,
            title,
            content,
            summary,
            season,
            common,
        } => {
            if title.is_none() && content.is_none() && summary.is_none() && season.is_none() && common.is_empty() {
                nothing_to_update()?;
            }
            let update = KnowledgeUpdate {
                title,
                content,
                summary,
                category_id: common.category_id(&service).await?,
                tags: common.tags,
                keywords: common.keywords,
                difficulty_level: common.difficulty,
                region: common.region,
                crop_type: common.crop,
                season,
            };
            let item = service.update_knowledge(&id, update).await?;
            print_updated("knowledge article", &item.id, &item.title);
        }

        UpdateCommands::Faq {
            id,
            question,
            answer,
            common,
        } => {
            if question.is_none() && answer.is_none() && common.is_empty() {
                nothing_to_update()?;
            }
            let update = FaqUpdate {
                question,
                answer,
                category_id: common.category_id(&service).await?,
                tags: common.tags,
                keywords: common.keywords,
                region: common.region,
                crop_type: common.crop,
                difficulty_level: common.difficulty,
            };
            let item = service.update_faq(&id, update).await?;
            print_updated("FAQ", &item.id, &item.question);
        }

        UpdateCommands::Practice {
            id,
            name,
            description,
            steps,
            benefits,
            requirements,
            season,
            common,
        } => {
            if name.is_none()
                && description.is_none()
                && steps.is_none()
                && benefits.is_none()
                && requirements.is_none()
                && season.is_none()
                && common.is_empty()
            {
                nothing_to_update()?;
            }
            let update = PracticeUpdate {
                practice_name: name,
                description,
                steps,
                benefits,
                requirements,
                category_id: common.category_id(&service).await?,
                crop_type: common.crop,
                season,
                region: common.region,
                difficulty_level: common.difficulty,
                tags: common.tags,
                keywords: common.keywords,
            };
            let item = service.update_practice(&id, update).await?;
            print_updated("practice", &item.id, &item.practice_name);
        }
    }

    Ok(())
}

fn nothing_to_update() -> Result<()> {
    anyhow::bail!("Nothing to update. Pass at least one field, e.g. --title or --tags.")
}

fn print_updated(noun: &str, id: &str, label: &str) {
    println!("{} Updated {}: {}", "✓".green(), noun, label.bold());
    println!("  ID: {}", id.cyan());
}
