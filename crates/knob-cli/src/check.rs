//! # Check Subcommand
//!
//! Compiles without writing anything. Exit status 0 on success, 1 when
//! the schema or config is rejected; the full error batch goes to stderr.

use anyhow::Result;
use clap::Args;

use crate::{compile_inputs, InputArgs};

/// Arguments for the check subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

/// Run the check subcommand.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    match compile_inputs(&args.inputs) {
        Ok(out) => {
            println!(
                "OK: {} ({} knobs)",
                args.inputs.config.display(),
                out.knobs.len()
            );
            Ok(0)
        }
        Err(e) => {
            eprintln!("FAIL: {e:#}");
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_inputs;

    #[test]
    fn check_passes_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let (schema, config) = write_inputs(dir.path(), "{}");
        let args = CheckArgs {
            inputs: InputArgs { schema, config },
        };
        assert_eq!(run_check(&args).unwrap(), 0);
    }

    #[test]
    fn check_fails_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let (schema, config) = write_inputs(dir.path(), r#"{ "label": 5 }"#);
        let args = CheckArgs {
            inputs: InputArgs { schema, config },
        };
        assert_eq!(run_check(&args).unwrap(), 1);
    }
}
