//! CLI type definitions
//!
//! Clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "uxmap")]
#[command(about = "UX-Map - Journey and feature discovery orchestrator", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Project root containing the docs/ workspace
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scaffold the docs/ workspace with seeded frontiers and prompt stubs
    Init,

    /// Schedule the next round: shard frontiers into worker task files
    PrepareRound,

    /// Merge the pending round's worker outputs into the accepted maps
    MergeRound,

    /// Print workspace state, counts, and coverage
    Status,
}
