// src/cli/args.rs
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::graph::Direction;

#[derive(Parser)]
#[command(name = "refguard", version, about = "Refactor risk analysis and transactional change execution")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index source files and print their structure
    Index {
        #[arg(default_value = ".")]
        path: PathBuf,
        /// Include files matching the test convention
        #[arg(long)]
        include_tests: bool,
        #[arg(long)]
        json: bool,
    },
    /// Build the dependency graph and report cycles
    Graph {
        #[arg(default_value = ".")]
        root: PathBuf,
        #[arg(long)]
        include_tests: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show what a file depends on and what depends on it
    Trace {
        file: PathBuf,
        /// forward, backward or both
        #[arg(long, short, default_value = "both")]
        direction: Direction,
        #[arg(long, default_value = "3")]
        depth: usize,
        /// Report unused imports and exports in the traced files
        #[arg(long)]
        include_unused: bool,
        /// Project root to analyze (default: detected from the file)
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Score how risky a refactor of the project is
    Score {
        #[arg(default_value = ".")]
        root: PathBuf,
        /// Use this coverage percentage instead of reading reports
        #[arg(long)]
        coverage: Option<f64>,
        #[arg(long)]
        json: bool,
    },
    /// Apply a change request with checkpoint, validation and rollback
    Execute {
        /// JSON execution request
        request: PathBuf,
        #[arg(long, default_value = ".")]
        root: PathBuf,
        #[arg(long)]
        json: bool,
    },
}
