//! Command-line interface for signsh
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Streaming sign language recognition
#[derive(Parser, Debug)]
#[command(name = "signsh", version, about = "Streaming sign language recognition")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model weights (path or http(s) URL), overrides model.model_path
    #[arg(long, global = true, value_name = "LOCATION")]
    pub model: Option<String>,

    /// Label vocabulary (path or http(s) URL), overrides model.labels_path
    #[arg(long, global = true, value_name = "LOCATION")]
    pub labels: Option<String>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug logs, -vv: trace logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recognize signs from JSON-Lines pose frames (stdin by default)
    Run {
        /// Read frames from a file instead of stdin
        #[arg(long, short = 'i', value_name = "FILE")]
        input: Option<PathBuf>,

        /// Print each result as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Load the model and label assets and report what was found
    Check,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration inspection actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}

impl Cli {
    /// Default log filter for the given verbosity.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}
