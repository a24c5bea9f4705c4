//! Trellis CLI — cache inspection and maintenance for Trellis projects.
//!
//! Provides `trellis stats` for a snapshot of the cache tiers and the
//! dependency graph, `trellis invalidate` for applying an invalidation
//! strategy to a target, and `trellis clear` for wiping the cache.

#![warn(missing_docs)]

mod invalidate;
mod session;
mod stats;

use std::process;

use clap::{Parser, Subcommand};

/// Trellis — incremental build cache for UI compilation.
#[derive(Parser, Debug)]
#[command(name = "trellis", version, about = "Trellis incremental build cache")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the project directory containing `trellis.toml`.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show cache and graph statistics.
    Stats(StatsArgs),
    /// Apply an invalidation strategy to a target.
    Invalidate(InvalidateArgs),
    /// Clear the entire cache (graph signatures are kept).
    Clear,
}

/// Arguments for the `trellis stats` subcommand.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Emit the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `trellis invalidate` subcommand.
#[derive(Parser, Debug)]
pub struct InvalidateArgs {
    /// The target: a file path, node id, or wildcard pattern.
    pub target: String,

    /// Strategy to apply.
    #[arg(short, long, default_value = "selective")]
    pub strategy: String,
}

/// Global flags shared by all subcommands.
#[derive(Debug)]
pub struct GlobalArgs {
    /// Suppress non-error output.
    pub quiet: bool,

    /// Enable verbose output.
    pub verbose: bool,

    /// Project directory override.
    pub project: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        project: cli.project,
    };

    let result = match &cli.command {
        Command::Stats(args) => stats::run(args, &global),
        Command::Invalidate(args) => invalidate::run(args, &global),
        Command::Clear => invalidate::run_clear(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
