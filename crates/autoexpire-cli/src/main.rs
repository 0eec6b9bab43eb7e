use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use autoexpire_core::{scheduler::Client, AppConfig, CronRequest};

mod commands;

#[derive(Parser)]
#[command(name = "autoexpire")]
#[command(author, version, about = "Unpublish and archive blog posts by title and age")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ~/.config/autoexpire/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rules as the scheduled site cron
    Cron {
        /// Report what would happen without changing any post
        #[arg(long)]
        dry_run: bool,
    },
    /// Dispatch a request the way the web host would
    Run {
        /// Value of the request's `task` parameter
        #[arg(long)]
        task: Option<String>,
        /// Set the request's `cron` flag
        #[arg(long)]
        cron: bool,
        /// Treat the request as coming from the administrator side
        #[arg(long)]
        admin: bool,
        /// Report what would happen without changing any post
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the rules loaded from configuration
    Rules {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Cron { dry_run } => {
            commands::run::run(&config, CronRequest::scheduled(), dry_run).await
        }
        Commands::Run { task, cron, admin, dry_run } => {
            let request = CronRequest {
                task,
                cron,
                client: if admin { Client::Administrator } else { Client::Site },
            };
            commands::run::run(&config, request, dry_run).await
        }
        Commands::Rules { json } => commands::rules::run(&config, json),
    }
}
