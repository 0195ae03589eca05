//! shopsync CLI
//!
//! Reconciles a product catalog file with a CCV Shop.
//!
//! # Commands
//!
//! - `diff` - Load catalog and shop, print the differences, optionally apply them
//! - `version` - Show version information

mod commands;
mod settings;

use clap::{ArgAction, Parser, Subcommand};
use commands::diff::DiffOptions;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog to CCV Shop reconciliation.
#[derive(Parser)]
#[command(name = "shopsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(global = true, short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the differences between catalog and shop
    Diff {
        /// Environment file with the API credentials
        #[arg(short = 'c', long)]
        env_file: Option<PathBuf>,

        /// Apply the differences to the shop
        #[arg(short, long)]
        sync: bool,

        /// Keep syncing past per-entity failures
        #[arg(long)]
        continue_on_failure: bool,

        /// Write the diff as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn log_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        })
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .init();

    match cli.command {
        Commands::Diff {
            env_file,
            sync,
            continue_on_failure,
            output,
        } => {
            commands::diff::run(DiffOptions {
                env_file,
                sync,
                continue_on_failure,
                output,
            })
            .await?;
        }
        Commands::Version => {
            println!("shopsync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("shopsync core v{}", shopsync_core::VERSION);
            println!("shopsync engine v{}", shopsync_engine::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_diff_flags() {
        let cli = Cli::parse_from([
            "shopsync",
            "-vv",
            "diff",
            "-c",
            "prod.env",
            "--sync",
            "--continue-on-failure",
            "-o",
            "diff.json",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Diff {
                env_file,
                sync,
                continue_on_failure,
                output,
            } => {
                assert_eq!(env_file, Some(PathBuf::from("prod.env")));
                assert!(sync);
                assert!(continue_on_failure);
                assert_eq!(output, Some(PathBuf::from("diff.json")));
            }
            Commands::Version => panic!("expected diff"),
        }
    }
}
