//! agrikb CLI - Entry point
//!
//! Usage: agrikb <command> [options]

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agrikb::cli::{self, utils::load_config, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    let filter = if opts.verbose {
        EnvFilter::new("agrikb=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = opts.config.as_deref();

    match opts.command {
        Commands::Init(args) => cli::init::run(args),
        Commands::Config(args) => cli::config::run(args),
        Commands::Categories(args) => cli::categories::run(args, &load_config(config_path)?).await,
        Commands::Add(args) => cli::add::run(args, &load_config(config_path)?).await,
        Commands::Update(args) => cli::update::run(args, &load_config(config_path)?).await,
        Commands::Delete(args) => cli::delete::run(args, &load_config(config_path)?).await,
        Commands::Search(args) => cli::search::run(args, &load_config(config_path)?).await,
        Commands::Analytics(args) => cli::analytics::execute(args, &load_config(config_path)?).await,
        Commands::Context(args) => cli::context::run(args, &load_config(config_path)?).await,
        Commands::FaqUsed(args) => cli::usage::run(args, &load_config(config_path)?).await,
        Commands::Manage(args) => cli::manage::run(args, &load_config(config_path)?).await,
    }
}
