//! Values observed and produced by expressions.

use serde_json::Value;

/// A typed expression value.
///
/// Equality is strict: values of different types are never equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprValue {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// String.
    Str(String),
    /// Slot absent from the config tree, or holding a non-scalar.
    Undefined,
}

impl ExprValue {
    /// Convert a stored config value.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n.as_i64().map_or(Self::Undefined, Self::Int),
            Value::String(s) => Self::Str(s.clone()),
            Value::Null | Value::Array(_) | Value::Object(_) => Self::Undefined,
        }
    }

    /// Truthiness: `true`, non-zero integers and non-empty strings.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(n) => *n != 0,
            Self::Str(s) => !s.is_empty(),
            Self::Undefined => false,
        }
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Str(_) => "string",
            Self::Undefined => "undefined",
        }
    }
}

impl std::fmt::Display for ExprValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Undefined => f.write_str("undefined"),
        }
    }
}
