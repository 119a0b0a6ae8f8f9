mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "contact_dates=info,contact_dates_core=info,contact_dates_google=info";
const VERBOSE_LOG_FILTER: &str = "contact_dates=debug,contact_dates_core=debug,contact_dates_google=debug";

#[derive(Parser)]
#[command(name = "contact-dates")]
#[command(about = "Turn your contacts' birthdays and special dates into recurring calendar events")]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/contact-dates/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Google (Calendar and Contacts)
    Auth,
    /// Create missing events for every contact date
    Sync {
        /// Only log what would be created
        #[arg(long)]
        dry_run: bool,
    },
    /// Delete the events created by `sync`
    Delete {
        /// Only log what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the effective settings
    Show,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = config::resolve_path(cli.config.as_deref())?;

    match cli.command {
        Commands::Auth => commands::auth::run().await,
        Commands::Sync { dry_run } => commands::sync::run(&config_path, dry_run).await,
        Commands::Delete { dry_run } => commands::delete::run(&config_path, dry_run).await,
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config::init(&config_path, force),
            ConfigAction::Show => commands::config::show(&config_path),
        },
    }
}
