//! # Structural Validation
//!
//! Validates a config tree against the structural schema produced by
//! [`declare`](crate::declaration::declare), using the `jsonschema` crate
//! (Draft 7).
//!
//! Before validation the tree is *normalized* in place:
//!
//! - fields not described by a node's `properties`/`patternProperties`
//!   are removed, whatever that node's `additionalProperties` says;
//! - missing properties that carry a `default` receive a copy of it.
//!   Defaults are applied parent first, so an object filled in from its
//!   default then has its own children defaulted;
//! - an integral float (`1.0`) in an `"integer"` slot is rewritten as an
//!   integer. Draft 7 accepts it as an integer, and the evaluator and the
//!   generators only read it as one after the rewrite.
//!
//! A node's properties are the union over the node and every schema in its
//! `allOf`, recursively.
//!
//! Normalization is idempotent: feeding a normalized tree back in strips
//! nothing and adds nothing.

use jsonschema::Validator;
use knob_core::Location;
use regex::Regex;
use serde_json::{Map, Number, Value};

use crate::error::{CompileError, Violation};

/// Compiled structural validator plus the schema it was built from.
pub struct ConfigValidator {
    schema: Value,
    validator: Validator,
}

impl std::fmt::Debug for ConfigValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigValidator")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl ConfigValidator {
    /// Compile `schema`.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::ValidatorBuild` if `jsonschema` rejects it
    /// (e.g. a malformed `pattern`).
    pub fn new(schema: Value) -> Result<Self, CompileError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft7);
        let validator = opts
            .build(&schema)
            .map_err(|e| CompileError::ValidatorBuild {
                reason: e.to_string(),
            })?;
        Ok(Self { schema, validator })
    }

    /// The structural schema.
    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Strip unknown fields and apply defaults. Returns the locations of
    /// every stripped field, in visiting order.
    pub fn normalize(&self, tree: &mut Value) -> Vec<Location> {
        let mut stripped = Vec::new();
        normalize_node(&self.schema, tree, &Location::root(), &mut stripped);
        stripped
    }

    /// Every structural violation in `tree`.
    pub fn violations(&self, tree: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(tree)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect()
    }
}

/// The node itself followed by every object schema reachable through `allOf`.
fn facets<'s>(schema: &'s Value, out: &mut Vec<&'s Map<String, Value>>) {
    let Some(obj) = schema.as_object() else {
        return;
    };
    out.push(obj);
    if let Some(Value::Array(all)) = obj.get("allOf") {
        for sub in all {
            facets(sub, out);
        }
    }
}

fn normalize_node(schema: &Value, instance: &mut Value, location: &Location, stripped: &mut Vec<Location>) {
    let mut layers = Vec::new();
    facets(schema, &mut layers);
    if layers.is_empty() {
        return;
    }

    match instance {
        Value::Object(fields) => normalize_object(&layers, fields, location, stripped),
        Value::Array(elements) => {
            let items = layers.iter().find_map(|l| l.get("items"));
            for (i, element) in elements.iter_mut().enumerate() {
                let sub = match items {
                    Some(Value::Array(positional)) => positional.get(i),
                    other => other,
                };
                if let Some(sub) = sub {
                    normalize_node(sub, element, &location.child(i.to_string()), stripped);
                }
            }
        }
        Value::Number(n) => {
            if let Some(i) = integral_float(n).filter(|_| declares_integer(&layers)) {
                *instance = Value::from(i);
            }
        }
        _ => {}
    }
}

fn declares_integer(layers: &[&Map<String, Value>]) -> bool {
    layers
        .iter()
        .any(|l| l.get("type").and_then(Value::as_str) == Some("integer"))
}

/// `Some` for a float with no fractional part that fits an `i64`.
fn integral_float(n: &Number) -> Option<i64> {
    if n.is_i64() || n.is_u64() {
        return None;
    }
    let f = n.as_f64()?;
    // 2^63 is exact as f64; anything at or above it overflows i64.
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < 9_223_372_036_854_775_808.0).then(|| f as i64)
}

fn normalize_object(
    layers: &[&Map<String, Value>],
    fields: &mut Map<String, Value>,
    location: &Location,
    stripped: &mut Vec<Location>,
) {
    let properties: Vec<(&String, &Value)> = layers
        .iter()
        .filter_map(|l| l.get("properties").and_then(Value::as_object))
        .flat_map(|props| props.iter())
        .collect();
    let patterns: Vec<(Regex, &Value)> = layers
        .iter()
        .filter_map(|l| l.get("patternProperties").and_then(Value::as_object))
        .flat_map(|pp| pp.iter())
        .filter_map(|(pattern, sub)| Regex::new(pattern).ok().map(|re| (re, sub)))
        .collect();
    let additional = layers
        .iter()
        .find_map(|l| l.get("additionalProperties").filter(|v| v.is_object()));
    let closed = layers
        .iter()
        .any(|l| l.contains_key("properties") || l.contains_key("patternProperties"));

    if closed {
        fields.retain(|key, _| {
            let known = properties.iter().any(|(name, _)| *name == key)
                || patterns.iter().any(|(re, _)| re.is_match(key));
            if !known {
                stripped.push(location.child(key.as_str()));
            }
            known
        });
    }

    for (name, sub) in &properties {
        if fields.contains_key(name.as_str()) {
            continue;
        }
        if let Some(default) = sub.get("default") {
            fields.insert((*name).clone(), default.clone());
        }
    }

    for (key, child) in fields.iter_mut() {
        let mut subs: Vec<&Value> = properties
            .iter()
            .filter(|(name, _)| *name == key)
            .map(|(_, sub)| *sub)
            .chain(
                patterns
                    .iter()
                    .filter(|(re, _)| re.is_match(key))
                    .map(|(_, sub)| *sub),
            )
            .collect();
        if subs.is_empty() {
            subs.extend(additional);
        }
        let child_location = location.child(key.as_str());
        match subs.as_slice() {
            [] => {}
            [only] => normalize_node(only, child, &child_location, stripped),
            many => {
                let merged = Value::Object(Map::from_iter([(
                    "allOf".to_string(),
                    Value::Array(many.iter().map(|s| (*s).clone()).collect()),
                )]));
                normalize_node(&merged, child, &child_location, stripped);
            }
        }
    }
}
