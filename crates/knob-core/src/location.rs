//! # Config-Tree Locations
//!
//! A `Location` is the path of object keys from the root of a config tree
//! to the value slot a knob controls. It displays dotted (`net.ipv6.enabled`)
//! for messages and generated output, and converts to a JSON Pointer for
//! matching validator error paths.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::KnobError;

/// Path of object keys addressing one slot in a config tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location(Vec<String>);

impl Location {
    /// The root of the tree.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new location one key below this one.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.into());
        Self(segments)
    }

    /// The enclosing location, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    /// The key segments from the root.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True for the root location.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// RFC 6901 JSON Pointer for this location.
    pub fn pointer(&self) -> String {
        self.0
            .iter()
            .map(|s| format!("/{}", s.replace('~', "~0").replace('/', "~1")))
            .collect()
    }

    /// Read the value at this location, if every segment exists.
    pub fn lookup<'v>(&self, tree: &'v Value) -> Option<&'v Value> {
        self.0
            .iter()
            .try_fold(tree, |node, key| node.as_object()?.get(key))
    }

    /// Write `value` at this location, creating missing intermediate objects.
    ///
    /// # Errors
    ///
    /// Returns `KnobError::PathBlocked` if an intermediate segment exists but
    /// does not hold an object.
    pub fn assign(&self, tree: &mut Value, value: Value) -> Result<(), KnobError> {
        let Some((last, head)) = self.0.split_last() else {
            *tree = value;
            return Ok(());
        };

        let mut node = tree;
        for key in head {
            let map = node.as_object_mut().ok_or_else(|| self.blocked(key))?;
            node = map
                .entry(key.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        let map = node.as_object_mut().ok_or_else(|| self.blocked(last))?;
        map.insert(last.clone(), value);
        Ok(())
    }

    fn blocked(&self, segment: &str) -> KnobError {
        KnobError::PathBlocked {
            location: self.to_string(),
            segment: segment.to_string(),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for Location {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
