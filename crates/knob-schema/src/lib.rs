//! # knob-schema — Knob Compiler
//!
//! Turns an extended JSON Schema plus a config document into a build-tool
//! include and a C header.
//!
//! ## Extended schema
//!
//! A schema node becomes a *knob* when it carries `metaType` and `config`:
//!
//! ```json
//! {
//!   "type": "object",
//!   "properties": {
//!     "uart": {
//!       "metaType": "bool",
//!       "config": "UART",
//!       "default": true,
//!       "select": "SERIAL_CORE"
//!     },
//!     "baud": { "metaType": "int", "config": "UART_BAUD", "default": 115200, "depends": "UART" }
//!   }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`declaration`]: schema walk, knob registry, structural schema.
//! - [`validate`]: field stripping, defaults, structural validation.
//! - [`resolve`]: `select` propagation and `depends` checks.
//! - [`codegen`]: build-listing and header lines.
//! - [`compile`]: the pipeline.
//!
//! ## Crate Policy
//!
//! - The caller's config is never mutated; every compile works on a copy.
//! - Errors are batched where the problem set is independent (schema
//!   violations, structural violations, unmet dependencies) and immediate
//!   where it is not (expression errors).
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod codegen;
pub mod compile;
pub mod declaration;
pub mod error;
pub mod resolve;
pub mod validate;

pub use codegen::{header_line, makefile_line, Artifacts};
pub use compile::{compile, CompileOutput, KnobSchema};
pub use declaration::{KnobDecl, Selection};
pub use error::{
    CompileError, DependencyFailure, DependencyFailures, ValidationViolations, Violation,
};
pub use validate::ConfigValidator;
