mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use detour_core::Config;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "detour")]
#[command(about = "Detour - Manage redirect rules and see the time they save", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage redirect rules
    Rules {
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Show or change the hourly rate used for money estimates
    Rate {
        /// New rate, e.g. 42.5
        #[arg(allow_hyphen_values = true)]
        value: Option<String>,
        /// Remove the configured rate
        #[arg(long, conflicts_with = "value")]
        clear: bool,
    },
    /// Show time and money saved
    Stats,
    /// Follow storage changes and refresh stats live
    Watch,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// List every rule with its redirect count
    List,
    /// Add a rule redirecting a hostname to a URL
    Add { source: String, target: String },
    /// Change the source or target of a rule
    Edit {
        id: String,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        target: Option<String>,
    },
    /// Enable a rule
    Enable { id: String },
    /// Disable a rule
    Disable { id: String },
    /// Delete a rule
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("detour=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|error| {
        warn!(%error, "failed to load config, using defaults");
        Config::default()
    });

    let (storage, mut store) = commands::open_store(&config).await?;

    match cli.command {
        Commands::Rules { command } => match command {
            RulesCommand::List => commands::list_rules(&store),
            RulesCommand::Add { source, target } => {
                commands::add_rule(&mut store, &source, &target).await
            }
            RulesCommand::Edit { id, source, target } => {
                commands::edit_rule(&mut store, &id, source, target).await
            }
            RulesCommand::Enable { id } => commands::set_rule_enabled(&mut store, &id, true).await,
            RulesCommand::Disable { id } => {
                commands::set_rule_enabled(&mut store, &id, false).await
            }
            RulesCommand::Delete { id, yes } => commands::delete_rule(&mut store, &id, yes).await,
        },
        Commands::Rate { value, clear } => {
            commands::rate(&mut store, value.as_deref(), clear).await
        }
        Commands::Stats => {
            commands::stats(&store);
            Ok(())
        }
        Commands::Watch => commands::watch(&storage, store, config.watch.poll_interval()).await,
    }
}
