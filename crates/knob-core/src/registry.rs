//! # Knob Registry
//!
//! Maps knob names to the slot each one controls. Built once from a schema
//! and consulted by the expression evaluator, the resolver and the code
//! generators. Names are unique across the whole schema; entries iterate
//! in registration (declaration) order.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::KnobError;
use crate::kind::KnobKind;
use crate::location::Location;

/// One registered knob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnobEntry {
    /// Globally unique knob name, e.g. `CONFIG_UART`.
    pub name: String,
    /// Slot holding the knob's stored value.
    pub location: Location,
    /// Kind governing validation, projection and generation.
    pub kind: KnobKind,
    /// For choice members: the key the group selector must equal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    /// Suppressed from header generation.
    pub make_only: bool,
}

/// Insertion-ordered map from knob name to [`KnobEntry`].
#[derive(Debug, Clone, Default)]
pub struct KnobRegistry {
    entries: IndexMap<String, KnobEntry>,
}

impl KnobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a knob.
    ///
    /// # Errors
    ///
    /// Returns `KnobError::DuplicateName` if the name is already registered;
    /// the existing entry is left untouched.
    pub fn register(&mut self, entry: KnobEntry) -> Result<(), KnobError> {
        if self.entries.contains_key(&entry.name) {
            return Err(KnobError::DuplicateName {
                name: entry.name,
                location: entry.location.to_string(),
            });
        }
        self.entries.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Look up a knob by name.
    pub fn get(&self, name: &str) -> Option<&KnobEntry> {
        self.entries.get(name)
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registered entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &KnobEntry> {
        self.entries.values()
    }

    /// Number of registered knobs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no knob is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
