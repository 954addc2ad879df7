//! Analytics command - Show knowledge base counts and recent activity

use clap::Args;

use super::utils::{open_service, print_failures};
use crate::config::Config;

/// Analytics command arguments
#[derive(Args, Debug)]
pub struct AnalyticsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute analytics command
pub async fn execute(args: AnalyticsArgs, config: &Config) -> anyhow::Result<()> {
    let service = open_service(config)?;
    let analytics = service.analytics().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analytics)?);
    } else {
        let total = analytics.total_knowledge + analytics.total_faqs + analytics.total_practices;

        println!("📊 Knowledge Base Statistics\n");
        println!("  Active items:     {}", total);
        println!("  ├── Knowledge:    {}", analytics.total_knowledge);
        println!("  ├── FAQs:         {}", analytics.total_faqs);
        println!("  └── Practices:    {}", analytics.total_practices);

        if !analytics.top_categories.is_empty() {
            println!("\n📂 Categories:");
            for category in analytics.top_categories.iter().take(10) {
                println!("  {}", category.name);
            }
        }

        if !analytics.recent_activity.is_empty() {
            println!("\n🕑 Recent activity:");
            for activity in &analytics.recent_activity {
                println!(
                    "  {}  {}",
                    activity.created_at.format("%Y-%m-%d %H:%M"),
                    activity.title
                );
            }
        }

        println!("\n📁 Store: {}", service.store_name());
    }

    print_failures(&analytics.failures);

    Ok(())
}
