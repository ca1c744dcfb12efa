//! CLI definitions for LeadFlow.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LeadFlow CLI.
#[derive(Parser)]
#[command(name = "leadflow")]
#[command(about = "CRM lead-entry automation service")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the automation service in foreground (default)
    Serve {
        /// Override the configured API host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured API port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Validate the configuration file
    Check,

    /// Lead Store commands
    Leads {
        #[command(subcommand)]
        action: LeadsAction,
    },

    /// Print the persisted run state and recent log
    State {
        /// Number of log entries to show
        #[arg(long, default_value_t = 20)]
        tail: usize,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Clear the persisted run state and lead queue
    Reset {
        /// Also clear the run log
        #[arg(long)]
        logs: bool,
    },
}

#[derive(Subcommand)]
pub(crate) enum LeadsAction {
    /// List leads in the store
    List {
        /// Include leads that were already processed
        #[arg(long)]
        all: bool,

        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Check connectivity to the store
    Probe,

    /// Append a lead to the store
    Add {
        /// Given name
        #[arg(long)]
        given_name: String,

        /// Last name
        #[arg(long)]
        last_name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        mobile: Option<String>,

        #[arg(long)]
        telephone: Option<String>,

        /// Free-text notes about where the lead came from
        #[arg(long)]
        notes: Option<String>,
    },
}
