use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "lingo-progress")]
#[command(about = "Track XP, levels, achievements and challenges for language learning")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.lingo-progress/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the progress database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed one learning event, e.g. `record lessons 3`
    Record {
        /// Metric name: lessons, streak, accuracy, characters, practice_time
        metric: String,

        /// Observed value
        value: f64,
    },

    /// Grant bonus XP
    GrantXp {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },

    /// Show the ledger and level progress
    Status,

    /// List achievements (or badges) with their unlock state
    Achievements {
        /// List badges instead of achievements
        #[arg(long)]
        badges: bool,

        /// Only show items that are still locked
        #[arg(long)]
        locked: bool,
    },

    /// List challenges
    Challenges {
        /// Include completed and expired challenges
        #[arg(long)]
        all: bool,
    },

    /// Initialize a new ~/.lingo-progress/config.toml configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Delete all recorded progress
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let ctx = cli::Context::new(cli.config, cli.db);

    match cli.command {
        Some(Commands::Record { metric, value }) => {
            cli::record::record_command(&ctx, &metric, value)?;
        }
        Some(Commands::GrantXp { amount }) => {
            cli::record::grant_xp_command(&ctx, amount)?;
        }
        Some(Commands::Status) | None => {
            cli::status::status_command(&ctx)?;
        }
        Some(Commands::Achievements { badges, locked }) => {
            cli::achievements::achievements_command(&ctx, badges, locked)?;
        }
        Some(Commands::Challenges { all }) => {
            cli::challenges::challenges_command(&ctx, all)?;
        }
        Some(Commands::Init { force }) => {
            cli::init::init_command(&ctx, force)?;
        }
        Some(Commands::Reset { yes }) => {
            cli::status::reset_command(&ctx, yes)?;
        }
    }

    Ok(())
}
