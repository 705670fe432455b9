//! # Gen Subcommand
//!
//! Compiles a config and writes the artifacts. The build listing goes to
//! stdout unless `--makefile` names a file; the header is only written
//! when `--header` is given.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::{compile_inputs, InputArgs};

/// Banner placed at the top of generated headers.
pub const HEADER_BANNER: &str = "/*\n * Automatically generated by knobc. Do not edit.\n */";

/// Arguments for the gen subcommand.
#[derive(Args, Debug)]
pub struct GenArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Write the build listing here instead of stdout.
    #[arg(long)]
    pub makefile: Option<PathBuf>,

    /// Write the C header here.
    #[arg(long)]
    pub header: Option<PathBuf>,

    /// Write the resolved config tree here, as YAML.
    #[arg(long)]
    pub dump_config: Option<PathBuf>,
}

/// Wrap header defines with the banner. Always ends with a newline.
pub fn render_header(defines: &str) -> String {
    if defines.is_empty() {
        format!("{HEADER_BANNER}\n")
    } else {
        format!("{HEADER_BANNER}\n\n{defines}\n")
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = contents.len(), "wrote");
    Ok(())
}

/// Run the gen subcommand.
pub fn run_gen(args: &GenArgs) -> Result<u8> {
    let out = compile_inputs(&args.inputs)?;

    // Nothing is written until the compile has succeeded.
    match &args.makefile {
        Some(path) => write_file(path, &format!("{}\n", out.makefile))?,
        None => println!("{}", out.makefile),
    }
    if let Some(path) = &args.header {
        write_file(path, &render_header(&out.header))?;
    }
    if let Some(path) = &args.dump_config {
        let yaml = serde_yaml::to_string(&out.config).context("failed to serialize config")?;
        write_file(path, &yaml)?;
    }
    Ok(0)
}
