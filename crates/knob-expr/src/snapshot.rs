//! Flat knob-name → value snapshot of a config tree.
//!
//! A snapshot is captured fresh for every evaluation so that writes made
//! by earlier selections are visible to later expressions.

use std::collections::HashMap;

use knob_core::{KnobEntry, KnobRegistry, Projection};
use serde_json::Value;

use crate::value::ExprValue;

/// Projected values of every registered knob.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    values: HashMap<String, ExprValue>,
}

impl Snapshot {
    /// Project every registered knob's current value out of `tree`.
    pub fn capture(registry: &KnobRegistry, tree: &Value) -> Self {
        let values = registry
            .iter()
            .map(|entry| (entry.name.clone(), project(entry, tree)))
            .collect();
        Self { values }
    }

    /// Projected value of a knob, or `None` if the name is not registered.
    pub fn get(&self, name: &str) -> Option<&ExprValue> {
        self.values.get(name)
    }

    /// Number of knobs in the snapshot.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the snapshot holds no knobs.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, ExprValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, ExprValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// The value an expression observes for one knob.
///
/// - tristate `"n"` reads as `false`, `"m"`/`"y"` pass through;
/// - a choice member reads as `selector == member key`;
/// - everything else is visible as stored. Absent slots are `Undefined`.
pub fn project(entry: &KnobEntry, tree: &Value) -> ExprValue {
    let raw = entry.location.lookup(tree);
    match entry.kind.projection() {
        Projection::Raw => raw.map_or(ExprValue::Undefined, ExprValue::from_json),
        Projection::Tristate => match raw {
            Some(Value::String(s)) if s == "n" => ExprValue::Bool(false),
            Some(v) => ExprValue::from_json(v),
            None => ExprValue::Undefined,
        },
        Projection::Choice => {
            let selected = match (raw.and_then(Value::as_str), entry.choice.as_deref()) {
                (Some(selector), Some(key)) => selector == key,
                _ => false,
            };
            ExprValue::Bool(selected)
        }
    }
}
