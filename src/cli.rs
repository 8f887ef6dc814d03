//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "catman")]
#[command(version)]
#[command(about = "Create, delete and apply Gmail labels", long_about = None)]
pub struct Cli {
    /// Path to configuration file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pre-obtained OAuth access token; skips the browser sign-in
    #[arg(long, env = "CATMAN_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print the raw action response as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a label
    Create {
        /// Label name
        #[arg(default_value = "")]
        name: String,
    },

    /// Delete a label by name
    Delete {
        /// Label name
        #[arg(default_value = "")]
        name: String,
    },

    /// Apply a label to existing messages from the given senders
    Apply {
        /// Comma-separated sender addresses
        #[arg(short, long, default_value = "")]
        senders: String,

        /// Label to apply
        #[arg(short, long, default_value = "")]
        label: String,
    },

    /// List the account's labels
    Labels,
}
