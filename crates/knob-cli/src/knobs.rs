//! # Knobs Subcommand
//!
//! Lists the knobs a schema registers, in declaration order. With
//! `--config`, the resolved value of each declared knob is shown too.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use knob_core::{KnobEntry, KnobRegistry};
use serde::Serialize;
use serde_json::Value;

use crate::{document, load_schema};

/// Arguments for the knobs subcommand.
#[derive(Args, Debug)]
pub struct KnobsArgs {
    /// Extended schema document.
    #[arg(long, short = 's')]
    pub schema: PathBuf,

    /// Config document; adds the resolved value column.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// One row of the listing.
#[derive(Debug, Serialize)]
pub struct KnobRow<'r> {
    #[serde(flatten)]
    pub entry: &'r KnobEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Build the listing rows. `resolved` is the compiled config tree, if any.
pub fn rows<'r>(registry: &'r KnobRegistry, resolved: Option<&Value>) -> Vec<KnobRow<'r>> {
    registry
        .iter()
        .map(|entry| KnobRow {
            entry,
            value: resolved
                .and_then(|tree| entry.location.lookup(tree))
                .map(|v| match entry.choice.as_deref() {
                    Some(key) => Value::Bool(v.as_str() == Some(key)),
                    None => v.clone(),
                }),
        })
        .collect()
}

/// Render rows as an aligned table.
pub fn render_table(rows: &[KnobRow<'_>]) -> String {
    let width = rows.iter().map(|r| r.entry.name.len()).max().unwrap_or(0);
    rows.iter()
        .map(|row| {
            let e = row.entry;
            let mut line = format!("{:<width$}  {:<10}  {}", e.name, e.kind.as_str(), e.location);
            if let Some(key) = &e.choice {
                line.push_str(&format!(" [{key}]"));
            }
            if e.make_only {
                line.push_str(" (make only)");
            }
            if let Some(value) = &row.value {
                line.push_str(&format!(" = {value}"));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run the knobs subcommand.
pub fn run_knobs(args: &KnobsArgs) -> Result<u8> {
    let schema = load_schema(&args.schema)?;
    let resolved = match &args.config {
        Some(path) => {
            let config = document::load_document(path)?;
            let out = schema
                .compile(&config)
                .with_context(|| format!("failed to compile {}", path.display()))?;
            Some(out.config)
        }
        None => None,
    };

    let rows = rows(schema.registry(), resolved.as_ref());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        println!("{}", render_table(&rows));
    }
    Ok(0)
}
