//! # Code Generators
//!
//! Two mappings from a resolved knob to text:
//!
//! | Kind | Build listing | Header |
//! |------|---------------|--------|
//! | `str` | `NAME = v`, or `NAME=#` when empty | `#define NAME "v"` |
//! | `bool`, `menuconfig` | `NAME = y` / `NAME = n` | `#define NAME 1` when true |
//! | choice member | `y`/`n` by selector equality | `#define NAME 1` when selected |
//! | `tristate` | `NAME=v` | `1` for `y`, `2` for `m`, nothing for `n` |
//! | `int`, `hex`, `oct` | `NAME=v` | `#define NAME v` |
//!
//! `makeOnly` knobs never reach the header. Both outputs follow declaration
//! order and are newline-joined without a trailing newline.

use knob_core::{KnobEntry, KnobKind, KnobRegistry, Tristate};
use serde_json::Value;
use tracing::error;

use crate::error::CompileError;

/// Generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    /// Build-tool include (`NAME = value` lines).
    pub makefile: String,
    /// Preprocessor defines.
    pub header: String,
}

/// Scalar text of a stored value: strings unquoted, everything else as JSON.
fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_selected(entry: &KnobEntry, value: &Value) -> bool {
    value.as_str().is_some() && value.as_str() == entry.choice.as_deref()
}

/// Escape `s` for a C string literal that stays on one line.
fn escape_c_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // Octal, not `\x`: a hex escape would swallow following hex digits.
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Build-listing line for one knob.
pub fn makefile_line(entry: &KnobEntry, value: &Value) -> String {
    let name = &entry.name;
    let flag = |on: bool| format!("{name} = {}", if on { "y" } else { "n" });
    match entry.kind {
        KnobKind::Str => match value.as_str() {
            Some("") => format!("{name}=#"),
            _ => format!("{name} = {}", raw(value)),
        },
        KnobKind::Bool | KnobKind::Menuconfig => flag(value.as_bool() == Some(true)),
        KnobKind::BoolChoice => flag(is_selected(entry, value)),
        KnobKind::Int | KnobKind::Hex | KnobKind::Oct | KnobKind::Tristate | KnobKind::Menu => {
            format!("{name}={}", raw(value))
        }
    }
}

/// Header line for one knob, if it emits one.
pub fn header_line(entry: &KnobEntry, value: &Value) -> Option<String> {
    if entry.make_only {
        return None;
    }
    let name = &entry.name;
    let define = || format!("#define {name} 1");
    match entry.kind {
        KnobKind::Str => Some(format!("#define {name} \"{}\"", escape_c_string(&raw(value)))),
        KnobKind::Bool | KnobKind::Menuconfig => (value.as_bool() == Some(true)).then(define),
        KnobKind::BoolChoice => is_selected(entry, value).then(define),
        KnobKind::Tristate => value
            .as_str()
            .and_then(|s| s.parse::<Tristate>().ok())
            .and_then(|t| t.header_value())
            .map(|n| format!("#define {name} {n}")),
        KnobKind::Int | KnobKind::Hex | KnobKind::Oct | KnobKind::Menu => {
            Some(format!("#define {name} {}", raw(value)))
        }
    }
}

/// Generate both artifacts for `declared`, a list of knob names in
/// declaration order.
///
/// # Errors
///
/// Returns `CompileError::MissingValue` if a declared knob has no value.
pub fn generate<'n>(
    registry: &KnobRegistry,
    declared: impl IntoIterator<Item = &'n str>,
    tree: &Value,
) -> Result<Artifacts, CompileError> {
    let mut makefile = Vec::new();
    let mut header = Vec::new();

    for name in declared {
        let entry = registry.get(name).ok_or_else(|| CompileError::MissingValue {
            name: name.to_string(),
            location: String::new(),
        })?;
        let Some(value) = entry.location.lookup(tree) else {
            error!(knob = name, location = %entry.location, "declared knob has no value");
            return Err(CompileError::MissingValue {
                name: name.to_string(),
                location: entry.location.to_string(),
            });
        };
        makefile.push(makefile_line(entry, value));
        header.extend(header_line(entry, value));
    }

    Ok(Artifacts {
        makefile: makefile.join("\n"),
        header: header.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use knob_core::Location;
    use serde_json::json;

    fn entry(name: &str, kind: KnobKind) -> KnobEntry {
        KnobEntry {
            name: name.to_string(),
            location: Location::root().child("v"),
            kind,
            choice: None,
            make_only: false,
        }
    }

    fn member(name: &str, key: &str) -> KnobEntry {
        KnobEntry {
            choice: Some(key.to_string()),
            ..entry(name, KnobKind::BoolChoice)
        }
    }

    #[test]
    fn test_bool_mapping() {
        let e = entry("FEATURE_X", KnobKind::Bool);
        assert_eq!(makefile_line(&e, &json!(true)), "FEATURE_X = y");
        assert_eq!(header_line(&e, &json!(true)).as_deref(), Some("#define FEATURE_X 1"));
        assert_eq!(makefile_line(&e, &json!(false)), "FEATURE_X = n");
        assert_eq!(header_line(&e, &json!(false)), None);
    }

    #[test]
    fn test_empty_string() {
        let e = entry("LABEL", KnobKind::Str);
        assert_eq!(makefile_line(&e, &json!("")), "LABEL=#");
        assert_eq!(header_line(&e, &json!("")).as_deref(), Some("#define LABEL \"\""));
    }

    #[test]
    fn test_string_escaped_in_header_only() {
        let e = entry("BANNER", KnobKind::Str);
        let v = json!(r#"say "hi" \o/"#);
        assert_eq!(makefile_line(&e, &v), r#"BANNER = say "hi" \o/"#);
        assert_eq!(
            header_line(&e, &v).as_deref(),
            Some(r#"#define BANNER "say \"hi\" \\o/""#)
        );
    }

    #[test]
    fn test_string_with_newline_escaped() {
        let e = entry("LABEL", KnobKind::Str);
        let line = header_line(&e, &json!("a\nb\r\tc\u{1}1")).unwrap();
        assert_eq!(line, r#"#define LABEL "a\nb\r\tc\0011""#);
        assert_eq!(line.lines().count(), 1);
    }

    #[test]
    fn test_tristate_mapping() {
        let e = entry("USB", KnobKind::Tristate);
        assert_eq!(makefile_line(&e, &json!("m")), "USB=m");
        assert_eq!(header_line(&e, &json!("y")).as_deref(), Some("#define USB 1"));
        assert_eq!(header_line(&e, &json!("m")).as_deref(), Some("#define USB 2"));
        assert_eq!(header_line(&e, &json!("n")), None);
    }

    #[test]
    fn test_integer_mapping() {
        let e = entry("HZ", KnobKind::Hex);
        assert_eq!(makefile_line(&e, &json!(4096)), "HZ=4096");
        assert_eq!(header_line(&e, &json!(4096)).as_deref(), Some("#define HZ 4096"));
    }

    #[test]
    fn test_choice_members() {
        let arm = member("ARCH_ARM", "arm");
        let x86 = member("ARCH_X86", "x86");
        let sel = json!("x86");
        assert_eq!(makefile_line(&arm, &sel), "ARCH_ARM = n");
        assert_eq!(makefile_line(&x86, &sel), "ARCH_X86 = y");
        assert_eq!(header_line(&arm, &sel), None);
        assert_eq!(header_line(&x86, &sel).as_deref(), Some("#define ARCH_X86 1"));
    }

    #[test]
    fn test_make_only_suppresses_header() {
        let e = KnobEntry {
            make_only: true,
            ..entry("DEBUG", KnobKind::Bool)
        };
        assert_eq!(makefile_line(&e, &json!(true)), "DEBUG = y");
        assert_eq!(header_line(&e, &json!(true)), None);
    }

    #[test]
    fn test_generate_joins_in_order_and_reports_missing() {
        let mut reg = KnobRegistry::new();
        for (name, key, kind) in [("A", "a", KnobKind::Bool), ("B", "b", KnobKind::Int)] {
            reg.register(KnobEntry {
                location: Location::root().child(key),
                ..entry(name, kind)
            })
            .unwrap();
        }
        let out = generate(&reg, ["A", "B"], &json!({ "a": false, "b": 7 })).unwrap();
        assert_eq!(out.makefile, "A = n\nB=7");
        assert_eq!(out.header, "#define B 7");

        let err = generate(&reg, ["A", "B"], &json!({ "a": true })).unwrap_err();
        assert_eq!(err.to_string(), "b (B) is undefined");
    }
}
