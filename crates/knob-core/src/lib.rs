//! # knob-core — Foundational Types for the Knob Compiler
//!
//! This crate is the leaf of the workspace. It defines the closed set of
//! knob kinds, the paths that address value slots inside a config tree,
//! and the registry that maps knob names to those slots. Every other
//! crate depends on `knob-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Single `KnobKind` enum.** One definition, exhaustive `match`
//!    everywhere. Adding a kind forces the validator, the evaluator and
//!    both code generators to handle it.
//!
//! 2. **`Location` newtype.** Value slots are addressed by a sequence of
//!    object keys, never by ad-hoc dotted strings. Reads and writes
//!    through a location are the only way the pipeline touches the tree.
//!
//! 3. **Insertion-ordered registry.** `KnobRegistry` keeps schema
//!    declaration order so generated artifacts are reproducible.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `knob-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod kind;
pub mod location;
pub mod registry;

// Re-export primary types for ergonomic imports.
pub use error::{KindError, KnobError};
pub use kind::{KnobKind, Projection, Tristate, KNOB_KIND_COUNT};
pub use location::Location;
pub use registry::{KnobEntry, KnobRegistry};
