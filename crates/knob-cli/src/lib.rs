//! # knob-cli — the `knobc` command
//!
//! Reads schema and config documents from disk, hands them to
//! `knob-schema`, and writes the generated artifacts.
//!
//! ## Subcommands
//!
//! - `knobc gen`: compile and write the build listing, header and
//!   optionally the resolved config.
//! - `knobc check`: compile and report success or the error batch.
//! - `knobc knobs`: list the knobs a schema registers.
//!
//! ```bash
//! knobc gen --schema board.schema.yaml --config board.yaml \
//!     --makefile build/config.mk --header build/config.h
//! knobc check --schema board.schema.yaml --config board.yaml
//! knobc knobs --schema board.schema.yaml
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in `main.rs`; handlers take parsed args.
//! - All compile logic lives in `knob-schema`; this crate only does I/O.

pub mod check;
pub mod document;
pub mod generate;
pub mod knobs;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use knob_schema::{CompileOutput, KnobSchema};

/// Schema and config inputs shared by the compiling subcommands.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Extended schema document (.json, .yaml or .yml).
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Config document (.json, .yaml or .yml).
    #[arg(long, short = 'c')]
    pub config: PathBuf,
}

/// Load the schema at `path` and check it.
pub fn load_schema(path: &Path) -> Result<KnobSchema> {
    let document = document::load_document(path)?;
    let schema = KnobSchema::from_schema(&document)
        .with_context(|| format!("invalid schema {}", path.display()))?;
    tracing::info!(schema = %path.display(), knobs = schema.registry().len(), "schema loaded");
    Ok(schema)
}

/// Load both inputs and compile.
pub fn compile_inputs(inputs: &InputArgs) -> Result<CompileOutput> {
    let schema = load_schema(&inputs.schema)?;
    let config = document::load_document(&inputs.config)?;
    schema
        .compile(&config)
        .with_context(|| format!("failed to compile {}", inputs.config.display()))
}
