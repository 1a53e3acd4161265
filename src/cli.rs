//! Command-line interface for cfgdiff

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cfgdiff")]
#[command(about = "Ingest configuration exports as snapshots and diff them table by table")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override workspace location
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize cfgdiff workspace
    Init {
        /// Overwrite an existing configuration with defaults
        #[arg(long)]
        force: bool,
    },

    /// Ingest a delimited export as a new upload
    Ingest {
        /// Export file path
        file: PathBuf,

        /// Uploader recorded on the upload (defaults to the configured owner)
        #[arg(long)]
        owner: Option<String>,

        /// Records per store write (must be > 0)
        #[arg(long, value_parser = validate_batch_size)]
        batch_size: Option<usize>,

        /// Keep verbatim source lines next to the typed records
        #[arg(long)]
        keep_raw_lines: bool,

        /// Disable progress bars
        #[arg(long)]
        quiet: bool,
    },

    /// Compare two uploads
    Compare {
        /// Left upload: an upload id or "<file name>@<timestamp>"
        left: String,

        /// Right upload: an upload id or "<file name>@<timestamp>"
        right: String,

        /// "all" or one table discriminator
        #[arg(long, default_value = "all")]
        table: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,

        /// Write the JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Keep the JSON report under .cfgdiff/reports/
        #[arg(long)]
        save: bool,
    },

    /// Delete an upload and all of its records
    Delete {
        /// Upload id or "<file name>@<timestamp>"
        upload: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List upload history
    List {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show one upload
    Show {
        /// Upload id or "<file name>@<timestamp>"
        upload: String,

        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// List supported tables and aliases
    Tables {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },

    /// Show workspace statistics
    Stats {
        /// Output format: "pretty", "json"
        #[arg(long, default_value = "pretty")]
        format: String,
    },
}

/// Parse output format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {}. Use 'pretty' or 'json'", s)),
        }
    }
}

/// Validate that batch size is greater than 0
fn validate_batch_size(s: &str) -> Result<usize, String> {
    let batch_size: usize = s
        .parse()
        .map_err(|_| format!("Invalid batch size: '{}'. Must be a positive integer.", s))?;

    if batch_size == 0 {
        return Err("Batch size must be greater than 0".to_string());
    }

    Ok(batch_size)
}
