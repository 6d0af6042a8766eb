//! Command-line interface definition.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "symbiont",
    version,
    about = "Self-healing supervisor and evolution loop for a self-modifying worker"
)]
pub struct Cli {
    /// Load configuration from this file instead of the default chain
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the supervisor and the evolution loop together
    Run,

    /// Run only the worker supervisor
    Supervise,

    /// Run only the evolution loop
    Evolve,

    /// Print recorded evolution iterations
    History {
        /// Show at most this many of the most recent entries
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
}
