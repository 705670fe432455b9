//! Step-bounded evaluation.

use knob_core::KnobRegistry;
use serde_json::Value;

use crate::ast::{BinaryOp, Expr};
use crate::error::ExprError;
use crate::parser;
use crate::snapshot::Snapshot;
use crate::value::ExprValue;

/// Longest accepted expression source, in bytes.
pub const MAX_SOURCE_LEN: usize = 4096;

/// Deepest accepted nesting of parentheses and prefix operators.
pub const MAX_DEPTH: usize = 64;

/// Most AST nodes a single evaluation may visit.
///
/// Every node costs at least one source byte, so [`MAX_SOURCE_LEN`] alone
/// allows about 4k nodes; this caps evaluation at half of that.
pub const MAX_STEPS: usize = 2048;

/// A parsed expression, reusable across snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parse `source`.
    ///
    /// # Errors
    ///
    /// `TooLong`, `Lex`, `Parse` or `TooDeep`.
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        if source.len() > MAX_SOURCE_LEN {
            return Err(ExprError::TooLong {
                len: source.len(),
                max: MAX_SOURCE_LEN,
            });
        }
        let root = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// The source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The syntax tree.
    pub fn ast(&self) -> &Expr {
        &self.root
    }

    /// Distinct identifiers in order of first appearance.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut all = Vec::new();
        self.root.collect_identifiers(&mut all);
        let mut seen = std::collections::HashSet::new();
        all.retain(|name| seen.insert(*name));
        all
    }

    /// Check that every identifier names a knob in `snapshot`.
    pub fn resolve_names(&self, snapshot: &Snapshot) -> Result<(), ExprError> {
        match self.identifiers().into_iter().find(|n| snapshot.get(n).is_none()) {
            Some(unknown) => Err(ExprError::UnknownName(unknown.to_string())),
            None => Ok(()),
        }
    }

    /// Evaluate against `snapshot` and coerce the result to a boolean.
    ///
    /// Every identifier is resolved before evaluation starts, so an unknown
    /// name fails even on a branch that short-circuiting would skip.
    ///
    /// # Errors
    ///
    /// `UnknownName`, `TypeMismatch` or `StepLimit`.
    pub fn evaluate(&self, snapshot: &Snapshot) -> Result<bool, ExprError> {
        self.resolve_names(snapshot)?;
        let mut steps = 0usize;
        let value = eval_node(&self.root, snapshot, &mut steps)?;
        Ok(value.is_truthy())
    }
}

/// Evaluate `source` against the current state of `tree`.
///
/// Takes a fresh snapshot of every registered knob; nothing is retained
/// between calls.
pub fn evaluate(registry: &KnobRegistry, tree: &Value, source: &str) -> Result<bool, ExprError> {
    let expression = Expression::parse(source)?;
    expression.evaluate(&Snapshot::capture(registry, tree))
}

fn eval_node(expr: &Expr, snapshot: &Snapshot, steps: &mut usize) -> Result<ExprValue, ExprError> {
    *steps += 1;
    if *steps > MAX_STEPS {
        return Err(ExprError::StepLimit { max: MAX_STEPS });
    }

    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Ident(name) => snapshot
            .get(name)
            .cloned()
            .ok_or_else(|| ExprError::UnknownName(name.clone())),
        Expr::Not(inner) => {
            let v = eval_node(inner, snapshot, steps)?;
            Ok(ExprValue::Bool(!v.is_truthy()))
        }
        Expr::Binary { op, lhs, rhs } => {
            let left = eval_node(lhs, snapshot, steps)?;
            match op {
                BinaryOp::Or if left.is_truthy() => return Ok(ExprValue::Bool(true)),
                BinaryOp::And if !left.is_truthy() => return Ok(ExprValue::Bool(false)),
                _ => {}
            }
            let right = eval_node(rhs, snapshot, steps)?;
            apply(*op, &left, &right).map(ExprValue::Bool)
        }
    }
}

fn apply(op: BinaryOp, left: &ExprValue, right: &ExprValue) -> Result<bool, ExprError> {
    match op {
        BinaryOp::Or | BinaryOp::And => Ok(right.is_truthy()),
        BinaryOp::Eq => Ok(left == right),
        BinaryOp::Ne => Ok(left != right),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let (ExprValue::Int(a), ExprValue::Int(b)) = (left, right) else {
                return Err(ExprError::TypeMismatch {
                    op: op.symbol(),
                    lhs: left.type_name(),
                    rhs: right.type_name(),
                });
            };
            Ok(match op {
                BinaryOp::Lt => a < b,
                BinaryOp::Le => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            })
        }
    }
}
