//! # Knob Kinds — Single Source of Truth
//!
//! Defines the `KnobKind` enum: the closed set of type tags a schema may
//! put in a `metaType` keyword. Each kind fixes three things:
//!
//! 1. the structural rule its value slot must satisfy ([`KnobKind::value_rule`]),
//! 2. how a stored value is projected before an expression sees it
//!    ([`KnobKind::projection`]),
//! 3. how the value is encoded by the code generators (in `knob-schema`).
//!
//! Every `match` on `KnobKind` is exhaustive.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

use crate::error::KindError;

/// Number of knob kinds.
pub const KNOB_KIND_COUNT: usize = 9;

/// Type tag governing a knob's value domain and code-generation encoding.
///
/// | Tag | Value domain |
/// |-----|--------------|
/// | `int`, `hex`, `oct` | integer |
/// | `str` | string |
/// | `bool` | boolean |
/// | `tristate` | one of `"n"`, `"m"`, `"y"` |
/// | `boolChoice` | choice-group selector string, one of the choice keys |
/// | `menu` | object (pure grouping) |
/// | `menuconfig` | object with a boolean `enabled` field |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KnobKind {
    /// Decimal integer.
    Int,
    /// Integer conventionally written in hexadecimal.
    Hex,
    /// Integer conventionally written in octal.
    Oct,
    /// Free-form string.
    Str,
    /// Boolean.
    Bool,
    /// Kconfig tristate: no, module, yes.
    Tristate,
    /// Member of an exclusive choice group.
    BoolChoice,
    /// Grouping node without a value.
    Menu,
    /// Grouping node carrying an `enabled` boolean.
    Menuconfig,
}

/// How a stored value becomes the value an expression observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// The stored value is visible as-is.
    Raw,
    /// `"n"` reads as `false`; `"m"` and `"y"` pass through.
    Tristate,
    /// The member reads as `selector == member key`.
    Choice,
}

impl KnobKind {
    /// Returns all knob kinds.
    pub fn all_kinds() -> &'static [KnobKind; KNOB_KIND_COUNT] {
        &[
            Self::Int,
            Self::Hex,
            Self::Oct,
            Self::Str,
            Self::Bool,
            Self::Tristate,
            Self::BoolChoice,
            Self::Menu,
            Self::Menuconfig,
        ]
    }

    /// Returns the schema tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Hex => "hex",
            Self::Oct => "oct",
            Self::Str => "str",
            Self::Bool => "bool",
            Self::Tristate => "tristate",
            Self::BoolChoice => "boolChoice",
            Self::Menu => "menu",
            Self::Menuconfig => "menuconfig",
        }
    }

    /// True for kinds whose slot holds a scalar and which therefore need a
    /// `config` name and a `default` in the schema.
    pub fn is_value_kind(&self) -> bool {
        match self {
            Self::Int | Self::Hex | Self::Oct | Self::Str | Self::Bool | Self::Tristate => true,
            Self::BoolChoice | Self::Menu | Self::Menuconfig => false,
        }
    }

    /// True for integer-valued kinds.
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int | Self::Hex | Self::Oct)
    }

    /// Structural rule for the value slot a declaration of this kind controls.
    ///
    /// `choice_keys` is only consulted for [`KnobKind::BoolChoice`], where it
    /// enumerates the member keys the selector may take.
    pub fn value_rule(&self, choice_keys: &[&str]) -> Value {
        match self {
            Self::Int | Self::Hex | Self::Oct => json!({ "type": "integer" }),
            Self::Str => json!({ "type": "string" }),
            Self::Bool => json!({ "type": "boolean" }),
            Self::Tristate => json!({ "type": "string", "enum": ["n", "m", "y"] }),
            Self::BoolChoice => json!({ "type": "string", "enum": choice_keys }),
            Self::Menu => json!({ "type": "object" }),
            Self::Menuconfig => json!({
                "type": "object",
                "required": ["enabled"],
                "properties": { "enabled": { "type": "boolean" } }
            }),
        }
    }

    /// Projection applied before an expression observes the stored value.
    pub fn projection(&self) -> Projection {
        match self {
            Self::Tristate => Projection::Tristate,
            Self::BoolChoice => Projection::Choice,
            Self::Int
            | Self::Hex
            | Self::Oct
            | Self::Str
            | Self::Bool
            | Self::Menu
            | Self::Menuconfig => Projection::Raw,
        }
    }

    /// Whether `value` conforms to the scalar domain of this kind.
    ///
    /// For `menuconfig` the registered slot is the `enabled` field, so a
    /// boolean is expected. `menu` has no scalar slot and accepts objects.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Int | Self::Hex | Self::Oct => value.as_i64().is_some() || value.as_u64().is_some(),
            Self::Str | Self::BoolChoice => value.is_string(),
            Self::Bool | Self::Menuconfig => value.is_boolean(),
            Self::Tristate => value
                .as_str()
                .is_some_and(|s| s.parse::<Tristate>().is_ok()),
            Self::Menu => value.is_object(),
        }
    }
}

impl std::fmt::Display for KnobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnobKind {
    type Err = KindError;

    /// Parse a kind from its schema tag. Tags are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "hex" => Ok(Self::Hex),
            "oct" => Ok(Self::Oct),
            "str" => Ok(Self::Str),
            "bool" => Ok(Self::Bool),
            "tristate" => Ok(Self::Tristate),
            "boolChoice" => Ok(Self::BoolChoice),
            "menu" => Ok(Self::Menu),
            "menuconfig" => Ok(Self::Menuconfig),
            other => Err(KindError::Unknown(other.to_string())),
        }
    }
}

/// The three tristate states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate {
    /// `n`: disabled.
    No,
    /// `m`: built as a module.
    Module,
    /// `y`: built in.
    Yes,
}

impl Tristate {
    /// Returns the single-letter encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::No => "n",
            Self::Module => "m",
            Self::Yes => "y",
        }
    }

    /// `true` maps to `y`, `false` to `n`.
    pub fn from_bool(b: bool) -> Self {
        if b {
            Self::Yes
        } else {
            Self::No
        }
    }

    /// Numeric value used in generated headers; `n` emits no define.
    pub fn header_value(&self) -> Option<u8> {
        match self {
            Self::No => None,
            Self::Yes => Some(1),
            Self::Module => Some(2),
        }
    }
}

impl FromStr for Tristate {
    type Err = KindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Self::No),
            "m" => Ok(Self::Module),
            "y" => Ok(Self::Yes),
            other => Err(KindError::InvalidTristate(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_kinds_count_and_unique() {
        let kinds = KnobKind::all_kinds();
        assert_eq!(kinds.len(), KNOB_KIND_COUNT);
        let mut seen = std::collections::HashSet::new();
        for k in kinds {
            assert!(seen.insert(k), "Duplicate kind: {k}");
        }
    }

    #[test]
    fn test_as_str_roundtrip() {
        for kind in KnobKind::all_kinds() {
            let parsed: KnobKind = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_serde_format_matches_as_str() {
        for kind in KnobKind::all_kinds() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = "float".parse::<KnobKind>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid property type \"float\"");
        assert!("Bool".parse::<KnobKind>().is_err()); // case-sensitive
        assert!("".parse::<KnobKind>().is_err());
    }

    #[test]
    fn test_value_kinds() {
        let value_kinds: Vec<_> = KnobKind::all_kinds()
            .iter()
            .filter(|k| k.is_value_kind())
            .collect();
        assert_eq!(value_kinds.len(), 6);
        assert!(!KnobKind::BoolChoice.is_value_kind());
        assert!(!KnobKind::Menu.is_value_kind());
    }

    #[test]
    fn test_value_rule_choice_enumerates_keys() {
        let rule = KnobKind::BoolChoice.value_rule(&["arm", "x86"]);
        assert_eq!(rule["type"], "string");
        assert_eq!(rule["enum"], json!(["arm", "x86"]));
    }

    #[test]
    fn test_value_rule_menuconfig_requires_enabled() {
        let rule = KnobKind::Menuconfig.value_rule(&[]);
        assert_eq!(rule["required"], json!(["enabled"]));
        assert_eq!(rule["properties"]["enabled"]["type"], "boolean");
    }

    #[test]
    fn test_accepts() {
        assert!(KnobKind::Int.accepts(&json!(42)));
        assert!(!KnobKind::Hex.accepts(&json!("0x10")));
        assert!(KnobKind::Str.accepts(&json!("")));
        assert!(KnobKind::Bool.accepts(&json!(false)));
        assert!(KnobKind::Tristate.accepts(&json!("m")));
        assert!(!KnobKind::Tristate.accepts(&json!("yes")));
        assert!(!KnobKind::Tristate.accepts(&json!(true)));
        assert!(KnobKind::Menuconfig.accepts(&json!(true)));
    }

    #[test]
    fn test_projection() {
        assert_eq!(KnobKind::Tristate.projection(), Projection::Tristate);
        assert_eq!(KnobKind::BoolChoice.projection(), Projection::Choice);
        assert_eq!(KnobKind::Str.projection(), Projection::Raw);
    }

    #[test]
    fn test_tristate_header_values() {
        assert_eq!("y".parse::<Tristate>().unwrap().header_value(), Some(1));
        assert_eq!("m".parse::<Tristate>().unwrap().header_value(), Some(2));
        assert_eq!("n".parse::<Tristate>().unwrap().header_value(), None);
        assert!("Y".parse::<Tristate>().is_err());
        assert_eq!(Tristate::from_bool(true).as_str(), "y");
    }
}
