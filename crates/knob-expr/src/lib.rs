//! # knob-expr — Knob Expression Language
//!
//! Evaluates the small boolean language used by `depends` clauses and
//! `select` guards, e.g. `UART && (ARCH_ARM || BAUD >= 9600)`.
//!
//! ## Pipeline
//!
//! 1. [`token`]: logos lexer: identifiers, integer/string/bool literals,
//!    `!`, `&&`, `||`, `==`, `!=`, `<`, `<=`, `>`, `>=`, parentheses.
//! 2. [`parser`]: Pratt parser producing an [`ast::Expr`].
//! 3. [`snapshot`]: a flat name → value map captured from the current
//!    config tree, with per-kind projection applied.
//! 4. [`eval`]: step-bounded evaluation of the AST against a snapshot.
//!
//! ## Sandbox
//!
//! An expression can only observe the snapshot it is handed. There is no
//! ambient scope, no function call syntax and no way to mutate anything.
//! Every identifier must name a registered knob; an unknown name is an
//! error, never a silent `false`. Source length, nesting depth and
//! evaluation steps are all bounded.

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;
pub mod snapshot;
pub mod token;
pub mod value;

pub use error::ExprError;
pub use eval::{evaluate, Expression, MAX_DEPTH, MAX_SOURCE_LEN, MAX_STEPS};
pub use snapshot::{project, Snapshot};
pub use value::ExprValue;
