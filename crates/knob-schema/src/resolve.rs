//! # Dependency & Selection Resolver
//!
//! Runs over a config tree that has already been normalized and passed
//! structural validation.
//!
//! ## Stages
//!
//! 1. [`apply_selections`]: visits declarations in schema order. For each
//!    visited knob whose projected value is truthy, every `select` triple
//!    whose guard holds writes its value into the target's slot. Each
//!    guard sees a fresh snapshot, so earlier writes are visible. This is
//!    a single pass: a knob that is switched on by a selection *after* it
//!    was visited does not get its own selections applied.
//! 2. [`declared_knobs`]: the knobs whose enclosing object exists in the
//!    resolved tree, in declaration order. A choice group that is present
//!    without a selector is a violation.
//! 3. [`check_dependencies`]: every declared knob with a `depends` clause
//!    must satisfy `!KNOB || (EXPR)`. Failures are batched.
//!
//! Expression errors abort immediately.

use knob_core::{KnobEntry, KnobKind, KnobRegistry, Tristate};
use knob_expr::{project, Expression, Snapshot};
use serde_json::Value;
use tracing::{debug, trace};

use crate::declaration::{KnobDecl, Selection};
use crate::error::{CompileError, DependencyFailure, DependencyFailures, Violation};

/// Value a selection writes into `target`, after kind coercion.
///
/// | Target | `None` | `true` | `false` | other |
/// |--------|--------|--------|---------|-------|
/// | `bool`, `menuconfig` | `true` | `true` | `false` | error |
/// | `tristate` | `"y"` | `"y"` | `"n"` | `"n"`/`"m"`/`"y"` |
/// | choice member | member key | member key | error | error |
/// | `int`/`hex`/`oct`/`str` | error | must match the kind | | |
pub fn coerce(target: &KnobEntry, value: Option<&Value>) -> Result<Value, String> {
    match (target.kind, value) {
        (KnobKind::BoolChoice, None | Some(Value::Bool(true))) => target
            .choice
            .clone()
            .map(Value::String)
            .ok_or_else(|| format!("{} is not a choice member", target.name)),
        (KnobKind::BoolChoice, Some(other)) => Err(format!(
            "choice member {} can only be selected with true, not {other}",
            target.name
        )),
        (KnobKind::Tristate, None) => Ok(Value::String(Tristate::Yes.as_str().to_string())),
        (KnobKind::Tristate, Some(Value::Bool(b))) => {
            Ok(Value::String(Tristate::from_bool(*b).as_str().to_string()))
        }
        (KnobKind::Bool | KnobKind::Menuconfig, None) => Ok(Value::Bool(true)),
        (kind, None) => Err(format!("{kind} knob {} needs an explicit value", target.name)),
        (kind, Some(v)) if kind.accepts(v) => Ok(v.clone()),
        (kind, Some(v)) => Err(format!("{v} is not a valid {kind} value")),
    }
}

/// Check every `select` target against the registry. Run once per schema.
pub fn check_selections(decls: &[KnobDecl], registry: &KnobRegistry) -> Vec<Violation> {
    let mut violations = Vec::new();
    for decl in decls {
        for selection in &decl.select {
            let problem = match registry.get(&selection.knob) {
                None => "no such knob".to_string(),
                Some(target) => match coerce(target, selection.value.as_ref()) {
                    Ok(_) => continue,
                    Err(reason) => reason,
                },
            };
            violations.push(Violation {
                instance_path: decl.location.pointer(),
                schema_path: format!("{}/select", decl.schema_path),
                message: format!("Select validation failed for {}: {problem}", selection.knob),
            });
        }
    }
    violations
}

/// Whether the slot a declaration controls sits in an object that exists.
fn is_present(decl: &KnobDecl, tree: &Value) -> bool {
    match decl.location.parent() {
        Some(parent) => parent.lookup(tree).is_some_and(Value::is_object),
        None => true,
    }
}

fn expression_error(knob: &str, expression: &str, source: knob_expr::ExprError) -> CompileError {
    CompileError::Expression {
        knob: knob.to_string(),
        expression: expression.to_string(),
        source,
    }
}

/// Apply `select` clauses in declaration order. Returns the number of
/// values written.
///
/// # Errors
///
/// `CompileError::Expression` for a guard that fails to parse or evaluate;
/// `CompileError::SchemaInvalid` for a target the registry does not know;
/// `CompileError::ValidationFailed` if the write path is blocked by a
/// non-object value.
pub fn apply_selections(
    decls: &[KnobDecl],
    registry: &KnobRegistry,
    tree: &mut Value,
) -> Result<usize, CompileError> {
    let mut written = 0;
    for decl in decls {
        let Some(name) = decl.name.as_deref() else {
            continue;
        };
        if decl.select.is_empty() || !is_present(decl, tree) {
            continue;
        }
        let Some(entry) = registry.get(name) else {
            continue;
        };
        if !project(entry, tree).is_truthy() {
            trace!(knob = name, "knob is off; select skipped");
            continue;
        }
        for selection in &decl.select {
            if select_one(name, selection, registry, tree)? {
                written += 1;
            }
        }
    }
    debug!(written, "selections applied");
    Ok(written)
}

fn select_one(
    source: &str,
    selection: &Selection,
    registry: &KnobRegistry,
    tree: &mut Value,
) -> Result<bool, CompileError> {
    let guard = Expression::parse(&selection.expression)
        .map_err(|e| expression_error(source, &selection.expression, e))?;
    let holds = guard
        .evaluate(&Snapshot::capture(registry, tree))
        .map_err(|e| expression_error(source, &selection.expression, e))?;
    if !holds {
        trace!(knob = source, target = %selection.knob, guard = %selection.expression, "guard false");
        return Ok(false);
    }

    let invalid = |message: String| CompileError::SchemaInvalid {
        violations: crate::error::ValidationViolations::new(vec![Violation {
            instance_path: String::new(),
            schema_path: String::new(),
            message: format!("Select validation failed for {}: {message}", selection.knob),
        }]),
    };
    let target = registry
        .get(&selection.knob)
        .ok_or_else(|| invalid("no such knob".to_string()))?;
    let value = coerce(target, selection.value.as_ref()).map_err(invalid)?;

    trace!(knob = source, target = %target.name, location = %target.location, %value, "select");
    target
        .location
        .assign(tree, value)
        .map_err(|e| CompileError::ValidationFailed {
            violations: crate::error::ValidationViolations::new(vec![Violation {
                instance_path: target.location.pointer(),
                schema_path: String::new(),
                message: e.to_string(),
            }]),
        })?;
    Ok(true)
}

/// Declarations present in the resolved tree, in declaration order.
///
/// # Errors
///
/// Returns one violation per present choice group that has no selector.
pub fn declared_knobs<'d>(
    decls: &'d [KnobDecl],
    registry: &KnobRegistry,
    tree: &Value,
) -> Result<Vec<&'d KnobDecl>, Vec<Violation>> {
    let mut violations = Vec::new();
    let present: Vec<&KnobDecl> = decls.iter().filter(|d| is_present(d, tree)).collect();
    for decl in &present {
        if decl.kind != KnobKind::BoolChoice || decl.location.lookup(tree).is_some() {
            continue;
        }
        let keys: Vec<&str> = decl
            .members
            .iter()
            .filter_map(|m| registry.get(m).and_then(|e| e.choice.as_deref()))
            .collect();
        violations.push(Violation {
            instance_path: decl.location.pointer(),
            schema_path: format!("{}/choice", decl.schema_path),
            message: format!("no choice selected; expected one of {}", keys.join(", ")),
        });
    }
    if violations.is_empty() {
        Ok(present)
    } else {
        Err(violations)
    }
}

/// Check `depends` clauses of declared knobs, in declaration order.
///
/// The clause of a disabled knob is still parsed and its names resolved,
/// so a typo fails regardless of the knob's state.
///
/// # Errors
///
/// `CompileError::Expression` immediately on a bad expression;
/// `CompileError::DependenciesFailed` with every unmet clause otherwise.
pub fn check_dependencies(
    declared: &[&KnobDecl],
    registry: &KnobRegistry,
    tree: &Value,
) -> Result<(), CompileError> {
    let snapshot = Snapshot::capture(registry, tree);
    let mut failures = Vec::new();

    for decl in declared {
        let (Some(name), Some(depends)) = (decl.name.as_deref(), decl.depends.as_deref()) else {
            continue;
        };
        let expression =
            Expression::parse(depends).map_err(|e| expression_error(name, depends, e))?;
        expression
            .resolve_names(&snapshot)
            .map_err(|e| expression_error(name, depends, e))?;

        let enabled = snapshot.get(name).is_some_and(|v| v.is_truthy());
        if !enabled {
            trace!(knob = name, "knob is off; dependency holds");
            continue;
        }
        let holds = expression
            .evaluate(&snapshot)
            .map_err(|e| expression_error(name, depends, e))?;
        trace!(knob = name, depends, holds, "dependency");
        if !holds {
            failures.push(DependencyFailure {
                name: name.to_string(),
                expression: depends.to_string(),
            });
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(CompileError::DependenciesFailed {
            failures: DependencyFailures::new(failures),
        })
    }
}
