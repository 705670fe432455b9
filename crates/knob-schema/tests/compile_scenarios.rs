//! End-to-end compile scenarios.
//!
//! Each test drives `compile()` with a small schema/config pair and checks
//! the resolved tree, the generated artifacts, or the error batch.

use knob_expr::ExprError;
use knob_schema::{compile, CompileError, KnobSchema};
use proptest::prelude::*;
use serde_json::{json, Value};

fn bool_knob(name: &str, default: bool) -> Value {
    json!({ "metaType": "bool", "config": name, "default": default })
}

fn schema_error_messages(err: CompileError) -> Vec<String> {
    match err {
        CompileError::SchemaInvalid { violations } => {
            violations.into_inner().into_iter().map(|v| v.message).collect()
        }
        other => panic!("expected SchemaInvalid, got: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

fn board() -> Value {
    serde_yaml::from_str(
        r##"
type: object
types:
  flag:
    metaType: bool
    default: false
properties:
  kernel:
    metaType: menu
    default: {}
    properties:
      hz: { metaType: int, config: HZ, default: 100 }
      label: { metaType: str, config: KERNEL_LABEL, default: "" }
  usb:
    metaType: tristate
    config: USB
    default: "n"
  uart:
    $ref: "#/types/flag"
    config: UART
    select:
      - knob: USB
        value: "m"
        expression: USB == false
  arch:
    metaType: boolChoice
    default: arm
    choice:
      arm: ARCH_ARM
      x86: ARCH_X86
"##,
    )
    .unwrap()
}

#[test]
fn compiling_twice_is_byte_identical() {
    let config = json!({ "uart": true, "kernel": { "hz": 250, "label": "dev" } });
    let first = compile(&board(), &config).unwrap();
    let second = compile(&board(), &config).unwrap();
    assert_eq!(first.makefile, second.makefile);
    assert_eq!(first.header, second.header);
    assert_eq!(first.config, second.config);
}

#[test]
fn yaml_board_generates_expected_artifacts() {
    let out = compile(&board(), &json!({ "uart": true })).unwrap();
    assert_eq!(
        out.makefile,
        "HZ=100\nKERNEL_LABEL=#\nUSB=m\nUART = y\nARCH_ARM = y\nARCH_X86 = n"
    );
    assert_eq!(
        out.header,
        "#define HZ 100\n#define KERNEL_LABEL \"\"\n#define USB 2\n#define UART 1\n#define ARCH_ARM 1"
    );
}

proptest! {
    /// Compilation is deterministic and a resolved config is a fixed point.
    #[test]
    fn resolved_config_recompiles_to_itself(
        hz in 1i64..100_000,
        usb in prop::sample::select(vec!["n", "m", "y"]),
        uart in any::<bool>(),
        x86 in any::<bool>(),
        label in "[a-z \"]{0,12}",
    ) {
        let arch = if x86 { "x86" } else { "arm" };
        let config = json!({
            "kernel": { "hz": hz, "label": label },
            "usb": usb,
            "uart": uart,
            "arch": arch,
        });
        let first = compile(&board(), &config).unwrap();
        let second = compile(&board(), &config).unwrap();
        prop_assert_eq!(&first, &second);

        let again = compile(&board(), &first.config).unwrap();
        prop_assert_eq!(&again.config, &first.config);
        prop_assert_eq!(again.makefile, first.makefile);
        prop_assert_eq!(again.header, first.header);
    }
}

// ---------------------------------------------------------------------------
// Defaults and stripping
// ---------------------------------------------------------------------------

#[test]
fn missing_values_take_their_defaults() {
    let out = compile(&board(), &json!({})).unwrap();
    assert_eq!(out.config["kernel"]["hz"], 100);
    assert_eq!(out.config["kernel"]["label"], "");
    assert_eq!(out.config["usb"], "n");
    assert_eq!(out.config["uart"], false);
    assert_eq!(out.config["arch"], "arm");
}

#[test]
fn unknown_fields_are_stripped() {
    let config = json!({ "uart": false, "colour": "blue", "kernel": { "hz": 100, "tickless": true } });
    let out = compile(&board(), &config).unwrap();
    assert!(out.config.get("colour").is_none());
    assert!(out.config["kernel"].get("tickless").is_none());
}

// ---------------------------------------------------------------------------
// Type enforcement
// ---------------------------------------------------------------------------

#[test]
fn tristate_accepts_only_n_m_y() {
    for ok in ["n", "m", "y"] {
        let out = compile(&board(), &json!({ "usb": ok })).unwrap();
        assert_eq!(out.config["usb"], ok);
    }
    for bad in [json!("x"), json!("Y"), json!(true), json!(1)] {
        let err = compile(&board(), &json!({ "usb": bad })).unwrap_err();
        let CompileError::ValidationFailed { violations } = err else {
            panic!("expected ValidationFailed for {bad}, got {err}");
        };
        assert!(violations.violations().iter().all(|v| v.instance_path == "/usb"));
    }
}

#[test]
fn integral_float_reads_as_integer() {
    let schema = json!({
        "type": "object",
        "properties": {
            "hz": { "metaType": "int", "config": "HZ", "default": 100 },
            "fast": { "metaType": "bool", "config": "FAST", "default": true, "depends": "HZ == 1" }
        }
    });
    let out = compile(&schema, &json!({ "hz": 1.0 })).unwrap();
    assert_eq!(out.config["hz"], json!(1));
    assert_eq!(out.makefile, "HZ=1\nFAST = y");
    assert_eq!(out.header, "#define HZ 1\n#define FAST 1");

    let err = compile(&schema, &json!({ "hz": 1.5 })).unwrap_err();
    assert!(matches!(err, CompileError::ValidationFailed { .. }));
}

// ---------------------------------------------------------------------------
// Choice groups
// ---------------------------------------------------------------------------

fn three_way() -> Value {
    json!({
        "type": "object",
        "properties": {
            "sched": {
                "metaType": "boolChoice",
                "choice": { "rr": "SCHED_RR", "fifo": "SCHED_FIFO", "cfs": "SCHED_CFS" }
            }
        }
    })
}

#[test]
fn exactly_the_selected_member_is_true() {
    let out = compile(&three_way(), &json!({ "sched": "fifo" })).unwrap();
    assert_eq!(out.knobs, ["SCHED_RR", "SCHED_FIFO", "SCHED_CFS"]);
    assert_eq!(out.makefile, "SCHED_RR = n\nSCHED_FIFO = y\nSCHED_CFS = n");
    assert_eq!(out.header, "#define SCHED_FIFO 1");
}

#[test]
fn missing_selector_fails() {
    let err = compile(&three_way(), &json!({})).unwrap_err();
    let CompileError::ValidationFailed { violations } = err else {
        panic!("expected ValidationFailed, got {err}");
    };
    assert_eq!(violations.len(), 1);
    assert_eq!(violations.violations()[0].instance_path, "/sched");
}

#[test]
fn selector_outside_choice_keys_fails() {
    let err = compile(&three_way(), &json!({ "sched": "edf" })).unwrap_err();
    assert!(matches!(err, CompileError::ValidationFailed { .. }));
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

fn a_depends_on_b() -> Value {
    json!({
        "type": "object",
        "properties": {
            "a": { "metaType": "bool", "config": "A", "default": false, "depends": "B" },
            "b": bool_knob("B", false)
        }
    })
}

#[test]
fn enabled_knob_with_unmet_dependency_fails() {
    let err = compile(&a_depends_on_b(), &json!({ "a": true, "b": false })).unwrap_err();
    let CompileError::DependenciesFailed { failures } = err else {
        panic!("expected DependenciesFailed, got {err}");
    };
    assert_eq!(failures.len(), 1);
    assert_eq!(failures.failures()[0].name, "A");
    assert_eq!(failures.to_string(), r#""A" depends on: "B""#);
}

#[test]
fn met_dependency_compiles() {
    assert!(compile(&a_depends_on_b(), &json!({ "a": true, "b": true })).is_ok());
}

#[test]
fn disabled_knob_ignores_its_dependency() {
    assert!(compile(&a_depends_on_b(), &json!({ "a": false, "b": false })).is_ok());
}

#[test]
fn every_unmet_dependency_is_reported() {
    let schema = json!({
        "type": "object",
        "properties": {
            "a": { "metaType": "bool", "config": "A", "default": true, "depends": "C" },
            "b": { "metaType": "tristate", "config": "B", "default": "m", "depends": "C && A" },
            "c": bool_knob("C", false)
        }
    });
    let err = compile(&schema, &json!({})).unwrap_err();
    assert_eq!(
        err.to_string(),
        r#"Some dependencies failed: "A" depends on: "C", "B" depends on: "C && A""#
    );
}

// ---------------------------------------------------------------------------
// Selection ordering
// ---------------------------------------------------------------------------

#[test]
fn selection_satisfies_later_dependency() {
    let schema = json!({
        "type": "object",
        "properties": {
            "a": { "metaType": "bool", "config": "A", "default": false, "select": "B" },
            "b": { "metaType": "bool", "config": "B", "default": false, "depends": "A" }
        }
    });
    let out = compile(&schema, &json!({ "a": true })).unwrap();
    assert_eq!(out.config["b"], true);
    assert_eq!(out.makefile, "A = y\nB = y");
}

/// A selects B, and B (once on) selects C, which B depends on.
fn chain(order: &[&str]) -> Value {
    let knobs = json!({
        "a": { "metaType": "bool", "config": "A", "default": false, "select": "B" },
        "b": { "metaType": "bool", "config": "B", "default": false, "select": "C", "depends": "C" },
        "c": bool_knob("C", false)
    });
    let properties: serde_json::Map<String, Value> = order
        .iter()
        .map(|k| (k.to_string(), knobs[*k].clone()))
        .collect();
    json!({ "type": "object", "properties": properties })
}

#[test]
fn chained_selection_in_declaration_order_resolves() {
    let out = compile(&chain(&["a", "b", "c"]), &json!({ "a": true })).unwrap();
    assert_eq!(out.makefile, "A = y\nB = y\nC = y");
}

#[test]
fn chained_selection_against_declaration_order_is_not_revisited() {
    let err = compile(&chain(&["b", "a", "c"]), &json!({ "a": true })).unwrap_err();
    let CompileError::DependenciesFailed { failures } = err else {
        panic!("expected DependenciesFailed, got {err}");
    };
    assert_eq!(failures.to_string(), r#""B" depends on: "C""#);
}

#[test]
fn tristate_and_choice_targets_are_coerced() {
    let schema = json!({
        "type": "object",
        "properties": {
            "fast": {
                "metaType": "bool", "config": "FAST", "default": true,
                "select": [ { "knob": "USB" }, { "knob": "ARCH_X86" } ]
            },
            "usb": { "metaType": "tristate", "config": "USB", "default": "n" },
            "arch": { "metaType": "boolChoice", "default": "arm", "choice": { "arm": "ARCH_ARM", "x86": "ARCH_X86" } }
        }
    });
    let out = compile(&schema, &json!({})).unwrap();
    assert_eq!(out.config["usb"], "y");
    assert_eq!(out.config["arch"], "x86");
}

// ---------------------------------------------------------------------------
// Generation mapping
// ---------------------------------------------------------------------------

#[test]
fn bool_feature_maps_to_y_and_define() {
    let schema = json!({ "type": "object", "properties": { "x": bool_knob("FEATURE_X", false) } });

    let on = compile(&schema, &json!({ "x": true })).unwrap();
    assert_eq!(on.makefile, "FEATURE_X = y");
    assert_eq!(on.header, "#define FEATURE_X 1");

    let off = compile(&schema, &json!({ "x": false })).unwrap();
    assert_eq!(off.makefile, "FEATURE_X = n");
    assert_eq!(off.header, "");
}

#[test]
fn empty_string_maps_to_hash_marker() {
    let schema = json!({
        "type": "object",
        "properties": { "label": { "metaType": "str", "config": "LABEL", "default": "x" } }
    });
    let out = compile(&schema, &json!({ "label": "" })).unwrap();
    assert_eq!(out.makefile, "LABEL=#");
    assert_eq!(out.header, "#define LABEL \"\"");
}

#[test]
fn multi_line_string_stays_on_one_header_line() {
    let schema = json!({
        "type": "object",
        "properties": { "label": { "metaType": "str", "config": "LABEL", "default": "" } }
    });
    let out = compile(&schema, &json!({ "label": "a\nb" })).unwrap();
    assert_eq!(out.header, r#"#define LABEL "a\nb""#);
}

#[test]
fn make_only_stays_out_of_header() {
    let schema = json!({
        "type": "object",
        "properties": {
            "cc": { "metaType": "str", "config": "CROSS_COMPILE", "default": "arm-none-eabi-", "makeOnly": true }
        }
    });
    let out = compile(&schema, &json!({})).unwrap();
    assert_eq!(out.makefile, "CROSS_COMPILE = arm-none-eabi-");
    assert_eq!(out.header, "");
}

// ---------------------------------------------------------------------------
// Schema and expression errors
// ---------------------------------------------------------------------------

#[test]
fn duplicate_knob_name_is_schema_error() {
    let schema = json!({
        "properties": { "a": bool_knob("SAME", false), "b": bool_knob("SAME", true) }
    });
    let err = KnobSchema::from_schema(&schema).unwrap_err();
    assert_eq!(schema_error_messages(err), ["The config name exists: \"SAME\""]);
}

#[test]
fn knob_on_schema_root_is_schema_error() {
    let schema = json!({ "metaType": "bool", "config": "ROOT", "default": true });
    let err = compile(&schema, &json!({})).unwrap_err();
    assert_eq!(
        schema_error_messages(err),
        ["metaType \"bool\" must be declared on a property, not on the schema root"]
    );
}

#[test]
fn unknown_kind_is_schema_error() {
    let schema = json!({
        "properties": { "a": { "metaType": "float", "config": "A", "default": 0.5 } }
    });
    let err = compile(&schema, &json!({})).unwrap_err();
    assert_eq!(schema_error_messages(err), ["Invalid property type \"float\""]);
}

#[test]
fn unregistered_select_target_is_schema_error() {
    let schema = json!({
        "properties": {
            "a": { "metaType": "bool", "config": "A", "default": false, "select": ["B", "NOPE"] },
            "b": bool_knob("B", false)
        }
    });
    let err = compile(&schema, &json!({})).unwrap_err();
    assert_eq!(
        schema_error_messages(err),
        ["Select validation failed for NOPE: no such knob"]
    );
}

#[test]
fn unknown_name_in_depends_is_expression_error() {
    let schema = json!({
        "properties": {
            "a": { "metaType": "bool", "config": "A", "default": true, "depends": "B || GHOST" },
            "b": bool_knob("B", true)
        }
    });
    let err = compile(&schema, &json!({})).unwrap_err();
    let CompileError::Expression { knob, source, .. } = err else {
        panic!("expected Expression, got {err}");
    };
    assert_eq!(knob, "A");
    assert_eq!(source, ExprError::UnknownName("GHOST".into()));
}

#[test]
fn code_in_expression_is_rejected() {
    let schema = json!({
        "properties": {
            "a": { "metaType": "bool", "config": "A", "default": true, "depends": "process.exit(1)" }
        }
    });
    let err = compile(&schema, &json!({})).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Expression { source: ExprError::Lex { .. }, .. }
    ));
}
