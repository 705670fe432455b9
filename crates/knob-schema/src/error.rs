//! # Compile Errors
//!
//! A compile call either returns its full output or fails with exactly one
//! `CompileError`. Violations and dependency failures are batched: the
//! error carries every problem found, in document order, not just the first.

use std::fmt;

use knob_expr::ExprError;
use thiserror::Error;

/// Error returned by a compile call.
#[derive(Error, Debug)]
pub enum CompileError {
    /// The schema itself is malformed: unknown kind, duplicate knob name,
    /// bad keyword usage, or a selection that cannot be applied.
    #[error("schema is invalid:\n{violations}")]
    SchemaInvalid {
        /// Every authoring violation found.
        violations: ValidationViolations,
    },

    /// The config document does not conform to the schema.
    #[error("config validation failed:\n{violations}")]
    ValidationFailed {
        /// Every structural violation found.
        violations: ValidationViolations,
    },

    /// One or more enabled knobs have an unmet `depends` expression.
    #[error("Some dependencies failed: {failures}")]
    DependenciesFailed {
        /// Every unmet dependency, in declaration order.
        failures: DependencyFailures,
    },

    /// An expression could not be parsed or evaluated.
    #[error("expression {expression:?} on {knob} failed: {source}")]
    Expression {
        /// Knob whose `depends` or `select` carried the expression.
        knob: String,
        /// Expression source.
        expression: String,
        /// Underlying evaluator error.
        source: ExprError,
    },

    /// A declared knob has no value at generation time. This is a resolver
    /// defect, not a user input error.
    #[error("{location} ({name}) is undefined")]
    MissingValue {
        /// Knob name.
        name: String,
        /// Dotted location of the missing slot.
        location: String,
    },

    /// The generic validator rejected the translated schema.
    #[error("structural validator could not be built: {reason}")]
    ValidatorBuild {
        /// Reason reported by the validator.
        reason: String,
    },
}

/// A single violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer to the offending slot in the config tree.
    pub instance_path: String,
    /// JSON Pointer to the schema keyword that triggered the violation.
    pub schema_path: String,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Ordered collection of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Wrap a list of violations.
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// An enabled knob whose `depends` expression evaluated false.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyFailure {
    /// Knob name.
    pub name: String,
    /// The unmet expression.
    pub expression: String,
}

impl fmt::Display for DependencyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" depends on: \"{}\"", self.name, self.expression)
    }
}

/// Ordered collection of dependency failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyFailures(Vec<DependencyFailure>);

impl DependencyFailures {
    /// Wrap a list of failures.
    pub fn new(failures: Vec<DependencyFailure>) -> Self {
        Self(failures)
    }

    /// Returns the failures in declaration order.
    pub fn failures(&self) -> &[DependencyFailure] {
        &self.0
    }

    /// Returns the number of failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no failures.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DependencyFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}
