//! Expression errors.

use thiserror::Error;

/// Failure while parsing or evaluating a knob expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// Source exceeds [`crate::MAX_SOURCE_LEN`].
    #[error("expression is {len} bytes long; the limit is {max}")]
    TooLong {
        /// Length of the rejected source.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Input the lexer does not recognize.
    #[error("unrecognized input {fragment:?} at offset {offset}")]
    Lex {
        /// Byte offset of the fragment.
        offset: usize,
        /// The offending text.
        fragment: String,
    },

    /// Token sequence that does not form an expression.
    #[error("parse error at offset {offset}: {message}")]
    Parse {
        /// Byte offset where parsing failed.
        offset: usize,
        /// What was found and what was expected.
        message: String,
    },

    /// Nesting deeper than [`crate::MAX_DEPTH`].
    #[error("expression nests deeper than {max} levels")]
    TooDeep {
        /// Configured maximum.
        max: usize,
    },

    /// Identifier that is not a registered knob.
    #[error("{0} is not defined")]
    UnknownName(String),

    /// Ordering comparison on operands that are not both integers.
    #[error("cannot apply '{op}' to {lhs} and {rhs}")]
    TypeMismatch {
        /// Operator symbol.
        op: &'static str,
        /// Type of the left operand.
        lhs: &'static str,
        /// Type of the right operand.
        rhs: &'static str,
    },

    /// Evaluation took more than [`crate::MAX_STEPS`] steps.
    #[error("evaluation exceeded {max} steps")]
    StepLimit {
        /// Configured maximum.
        max: usize,
    },
}
