//! # knobc entry point
//!
//! Parses command-line arguments, installs logging and dispatches to the
//! subcommand handlers in `knob_cli`.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use knob_cli::check::{run_check, CheckArgs};
use knob_cli::generate::{run_gen, GenArgs};
use knob_cli::knobs::{run_knobs, KnobsArgs};

/// Knob compiler
///
/// Validates a config document against an extended schema, resolves
/// `depends` and `select` clauses, and generates a build-tool include and
/// a C header.
#[derive(Parser, Debug)]
#[command(name = "knobc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile and write the build listing and header.
    #[command(name = "gen")]
    Gen(GenArgs),

    /// Compile and report success or the full error batch.
    Check(CheckArgs),

    /// List the knobs a schema registers.
    Knobs(KnobsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("knobc {} starting", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Gen(args) => run_gen(&args),
        Commands::Check(args) => run_check(&args),
        Commands::Knobs(args) => run_knobs(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
