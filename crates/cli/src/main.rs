//! MergeDesk command-line merge tool.
//!
//! Provides subcommands for running interactive three-way merge sessions,
//! probing whether a merge is clean, managing scratch backups, and
//! generating a configuration file.

mod commands;
mod dialogs;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mergedesk_core::config::AppConfig;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// MergeDesk command-line merge tool.
#[derive(Parser, Debug)]
#[command(
    name = "mergedesk",
    version,
    about = "Run and inspect three-way merge sessions in the terminal"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an interactive merge session.
    Merge {
        /// Common ancestor document.
        base: String,

        /// The local side.
        ours: String,

        /// The incoming side.
        theirs: String,

        /// Target file receiving the merge result.
        #[arg(short, long)]
        output: String,

        /// Edit the target file in place instead of a scratch document.
        #[arg(long)]
        in_place: bool,

        /// Conflict marker label for the local side.
        #[arg(long)]
        ours_label: Option<String>,

        /// Conflict marker label for the incoming side.
        #[arg(long)]
        theirs_label: Option<String>,
    },

    /// Check whether a three-way merge is clean (exit 1 when conflicted).
    Check {
        /// Common ancestor document.
        base: String,

        /// The local side.
        ours: String,

        /// The incoming side.
        theirs: String,
    },

    /// Manage scratch backups.
    Backups {
        #[command(subcommand)]
        action: BackupsAction,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum BackupsAction {
    /// List saved scratch backups.
    List,

    /// Remove backups older than the cutoff.
    Prune {
        /// Age cutoff in days (defaults to storage.prune_after_days).
        #[arg(long)]
        days: Option<u32>,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config, cli.verbose);

    match run(cli, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &AppConfig, verbose: u8) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli, config: AppConfig) -> Result<ExitCode> {
    match cli.command {
        Commands::Merge {
            base,
            ours,
            theirs,
            output,
            in_place,
            ours_label,
            theirs_label,
        } => {
            commands::merge::run(
                &config,
                commands::merge::MergeOpts {
                    base,
                    ours,
                    theirs,
                    output,
                    in_place,
                    ours_label,
                    theirs_label,
                },
            )
            .await
        }
        Commands::Check { base, ours, theirs } => {
            commands::check::run(&config, &base, &ours, &theirs).await
        }
        Commands::Backups { action } => match action {
            BackupsAction::List => commands::backups::run_list(&config).await,
            BackupsAction::Prune { days } => commands::backups::run_prune(&config, days).await,
        },
        Commands::Init { output, force } => commands::init::run(output, force),
    }
}
