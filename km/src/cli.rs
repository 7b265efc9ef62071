//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::update::UpdateRule;

/// km - distributed k-means over a local group of ranks
#[derive(Parser, Debug)]
#[command(name = "km", author, version, about = "Distributed k-means over a fixed SPMD group of ranks")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Cluster a dataset
    Run {
        /// Dataset file (overrides config `input`)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of clusters
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Number of ranks, coordinator included
        #[arg(short, long)]
        workers: Option<usize>,

        /// Maximum rounds
        #[arg(short, long)]
        max_iterations: Option<u32>,

        /// Seed for initial centroid selection
        #[arg(short, long)]
        seed: Option<u64>,

        /// Centroid update rule (midpoint, mean)
        #[arg(short, long)]
        update_rule: Option<UpdateRule>,

        /// Write centroids and dataset to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip malformed dataset rows
        #[arg(long)]
        skip_malformed: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show how a dataset splits across ranks
    Inspect {
        /// Dataset file (overrides config `input`)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of ranks, coordinator included
        #[arg(short, long)]
        workers: Option<usize>,

        /// Skip malformed dataset rows
        #[arg(long)]
        skip_malformed: bool,
    },

    /// Print the effective configuration
    Config,
}

/// Output format for run results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
