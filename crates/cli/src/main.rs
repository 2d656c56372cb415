//! gitscribe command-line tool.
//!
//! Drafts commit messages and pull request descriptions with a language
//! model, opens pull requests on GitHub, summarizes recent history, and
//! proposes resolutions for unresolved merge conflicts.

mod commands;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use gitscribe_core::config::AppConfig;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// gitscribe command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "gitscribe",
    version,
    about = "AI-assisted commit messages, pull requests, and merge-conflict resolution"
)]
struct Cli {
    /// Path to the TOML configuration file [default: $GITSCRIBE_CONFIG or
    /// <config dir>/gitscribe/config.toml].
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stage everything, commit with a generated message, and push.
    Sync {
        /// Repository path.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Deprecated alias of `sync`.
    Commit {
        /// Repository path.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Push the current branch and open a pull request.
    Prcreate {
        /// Repository path.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Base branch [default: github.default_base].
        #[arg(short, long)]
        base: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Push the current branch and open a draft pull request.
    Prdraft {
        /// Repository path.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Base branch [default: github.default_base].
        #[arg(short, long)]
        base: Option<String>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Propose resolutions for merge conflicts as `*.resolved` files.
    Resolve {
        /// Repository path.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Overwrite each conflicted file with its proposal. Existing
        /// `*.resolved` files are kept as reviewed, not regenerated.
        #[arg(long)]
        apply: bool,

        /// Model to use instead of the configured one.
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Summarize the most recent commits.
    Summarize {
        /// Repository path.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Number of commits to include.
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// Show commit and line statistics for a recent window.
    Stats {
        /// Repository path.
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Window such as 12h, 7d, 2w, 3m.
        #[arg(short, long, default_value = "7d")]
        last: String,
    },

    /// Manage the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a commented default configuration file.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show the effective configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::default_path().context("failed to locate configuration file")?,
    };
    debug!(path = %config_path.display(), "using configuration file");

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Init { force } => commands::config::run_init(&config_path, force),
            ConfigAction::Show => commands::config::run_show(&config_path),
        },
        Commands::Sync { repo, yes } => {
            commands::sync::run(&load_config(&config_path)?, &repo, yes).await
        }
        Commands::Commit { repo, yes } => {
            eprintln!(
                "{}",
                style::warn("`gitscribe commit` is deprecated; use `gitscribe sync`.")
            );
            commands::sync::run(&load_config(&config_path)?, &repo, yes).await
        }
        Commands::Prcreate { repo, base, yes } => {
            commands::pr::run(&load_config(&config_path)?, &repo, base, yes, false).await
        }
        Commands::Prdraft { repo, base, yes } => {
            commands::pr::run(&load_config(&config_path)?, &repo, base, yes, true).await
        }
        Commands::Resolve { repo, apply, model } => {
            commands::resolve::run(&load_config(&config_path)?, &repo, apply, model).await
        }
        Commands::Summarize { repo, count } => {
            commands::summarize::run(&load_config(&config_path)?, &repo, count).await
        }
        Commands::Stats { repo, last } => commands::stats::run(&repo, &last).await,
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load_and_resolve(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}
