//! # Error Types — Structured Error Hierarchy
//!
//! Errors raised by the foundational types. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Registry errors carry the offending knob name and where it was
//!   declared.
//! - Tree writes that cannot be performed carry the full location and the
//!   segment that blocked them.

use thiserror::Error;

/// Top-level error type for knob registry and config-tree operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KnobError {
    /// A knob name was registered twice.
    #[error("The config name exists: \"{name}\"")]
    DuplicateName {
        /// The knob name that was already registered.
        name: String,
        /// Location of the second declaration.
        location: String,
    },

    /// Kind tag or value-domain failure.
    #[error(transparent)]
    Kind(#[from] KindError),

    /// A write could not descend through a non-object value.
    #[error("cannot write '{location}': '{segment}' is not an object")]
    PathBlocked {
        /// The full location that was being written.
        location: String,
        /// The segment whose current value is not an object.
        segment: String,
    },
}

/// Error in kind tags or values that do not fit a kind's domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KindError {
    /// The kind tag is not one of the known knob kinds.
    #[error("Invalid property type \"{0}\"")]
    Unknown(String),

    /// A tristate string other than `n`, `m` or `y`.
    #[error("invalid tristate value {0:?}: expected one of \"n\", \"m\", \"y\"")]
    InvalidTristate(String),
}
