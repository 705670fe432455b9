//! # Knob Declarations
//!
//! Walks an extended schema document once, before any config is seen, and
//! splits it into two products:
//!
//! - a plain JSON Schema (the *structural schema*) handed to the generic
//!   validator, where every `metaType` has been expanded into the value
//!   rule of its kind and every knob keyword has been stripped;
//! - the knob declarations themselves, in document order, registered into
//!   a [`KnobRegistry`].
//!
//! ## Knob keywords
//!
//! | Keyword | Shape | Meaning |
//! |---------|-------|---------|
//! | `metaType` | kind tag | value domain of the slot |
//! | `config` | string | globally unique knob name |
//! | `default` | any | value applied when the slot is missing |
//! | `choice` | `{key: KNOB}` | members of a `boolChoice` group |
//! | `makeOnly` | bool | suppress from header output |
//! | `depends` | expression | must hold while the knob is enabled |
//! | `select` | see [`Selection`] | values forced while the knob is enabled |
//!
//! Reusable sub-schemas live under `types` (or `definitions`/`$defs`) and
//! are pulled in with local `$ref` pointers, which are inlined here.
//!
//! Authoring errors are collected across the whole document and returned
//! as one batch.

use std::str::FromStr;

use knob_core::{KnobEntry, KnobKind, KnobRegistry, Location};
use serde_json::{json, Map, Value};

use crate::error::{CompileError, ValidationViolations, Violation};

/// Keywords that declare or annotate a knob.
pub const KNOB_KEYWORDS: &[&str] = &["metaType", "config", "choice", "makeOnly", "depends", "select"];

/// Containers for reusable sub-schemas; dropped from the structural schema.
const DEFINITION_KEYWORDS: &[&str] = &["types", "definitions", "$defs"];

/// Generic JSON Schema (draft 7) vocabulary accepted on any node.
const SCHEMA_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$ref",
    "$comment",
    "title",
    "description",
    "default",
    "examples",
    "readOnly",
    "writeOnly",
    "type",
    "enum",
    "const",
    "multipleOf",
    "maximum",
    "exclusiveMaximum",
    "minimum",
    "exclusiveMinimum",
    "maxLength",
    "minLength",
    "pattern",
    "format",
    "items",
    "additionalItems",
    "maxItems",
    "minItems",
    "uniqueItems",
    "contains",
    "maxProperties",
    "minProperties",
    "required",
    "properties",
    "patternProperties",
    "additionalProperties",
    "dependencies",
    "propertyNames",
    "if",
    "then",
    "else",
    "allOf",
    "anyOf",
    "oneOf",
    "not",
    "contentMediaType",
    "contentEncoding",
    "errorMessage",
];

/// Reference chains longer than this are treated as cyclic.
pub const MAX_REF_DEPTH: usize = 32;

/// One `{knob, value, expression}` triple of a `select` clause.
///
/// A `select` keyword takes one of four shapes, all normalized to a list:
///
/// - `"KNOB"`
/// - `["KNOB_A", "KNOB_B"]`
/// - `{ knob: "KNOB", value: ..., expression: "..." }`
/// - a list of such objects
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Target knob name.
    pub knob: String,
    /// Value to write; `None` selects the target's "on" value.
    pub value: Option<Value>,
    /// Guard; the write happens only if this evaluates true.
    pub expression: String,
}

impl Selection {
    fn unconditional(knob: &str) -> Self {
        Self {
            knob: knob.to_string(),
            value: None,
            expression: "true".to_string(),
        }
    }

    fn from_object(obj: &Map<String, Value>) -> Result<Self, String> {
        if let Some(extra) = obj
            .keys()
            .find(|k| !matches!(k.as_str(), "knob" | "value" | "expression"))
        {
            return Err(format!("select entry has unexpected field \"{extra}\""));
        }
        let knob = obj
            .get("knob")
            .and_then(Value::as_str)
            .ok_or("select entry requires a string \"knob\"")?;
        let value = match obj.get("value") {
            Some(Value::Array(_)) => return Err("select value must not be an array".to_string()),
            other => other.cloned(),
        };
        let expression = match obj.get("expression") {
            None => "true",
            Some(Value::String(s)) => s.as_str(),
            Some(_) => return Err("select expression must be a string".to_string()),
        };
        Ok(Self {
            knob: knob.to_string(),
            value,
            expression: expression.to_string(),
        })
    }
}

/// Normalize a `select` keyword value to its list of triples.
pub fn parse_select(value: &Value) -> Result<Vec<Selection>, String> {
    match value {
        Value::String(knob) => Ok(vec![Selection::unconditional(knob)]),
        Value::Object(obj) => Ok(vec![Selection::from_object(obj)?]),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if items[..i].contains(item) {
                    return Err(format!("select entries must be unique; {item} repeats"));
                }
            }
            if items.iter().all(Value::is_string) {
                Ok(items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(Selection::unconditional)
                    .collect())
            } else if items.iter().all(Value::is_object) {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(Selection::from_object)
                    .collect()
            } else {
                Err("select list must hold only knob names or only select objects".to_string())
            }
        }
        _ => Err("select must be a knob name, an object, or a list of either".to_string()),
    }
}

/// A knob declaration found in the schema.
#[derive(Debug, Clone)]
pub struct KnobDecl {
    /// Knob name; `None` for a choice group, whose names are its members.
    pub name: Option<String>,
    /// Declared kind.
    pub kind: KnobKind,
    /// Slot holding the value (the selector, for choice groups).
    pub location: Location,
    /// JSON Pointer to the declaring node in the schema document.
    pub schema_path: String,
    /// Choice member names in table order.
    pub members: Vec<String>,
    /// `depends` expression.
    pub depends: Option<String>,
    /// `select` triples.
    pub select: Vec<Selection>,
}

impl KnobDecl {
    /// Names this declaration contributes to the declared set.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name.iter().chain(self.members.iter()).map(String::as_str)
    }
}

/// Output of the declaration walk.
#[derive(Debug, Clone)]
pub struct Declarations {
    /// Every knob, in document order.
    pub registry: KnobRegistry,
    /// Every declaration, in document order.
    pub decls: Vec<KnobDecl>,
    /// Plain JSON Schema for the structural validator.
    pub structural: Value,
}

/// Walk `schema`, collecting knob declarations and the structural schema.
///
/// # Errors
///
/// Returns `CompileError::SchemaInvalid` with every authoring violation
/// found in the document.
pub fn declare(schema: &Value) -> Result<Declarations, CompileError> {
    let mut walker = Walker {
        root: schema,
        registry: KnobRegistry::new(),
        decls: Vec::new(),
        violations: Vec::new(),
    };
    let structural = walker.node(schema, "", &Location::root(), Scope::Knobs, 0);

    if !walker.violations.is_empty() {
        return Err(CompileError::SchemaInvalid {
            violations: ValidationViolations::new(walker.violations),
        });
    }
    Ok(Declarations {
        registry: walker.registry,
        decls: walker.decls,
        structural,
    })
}

/// Whether knob keywords are allowed on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Node maps onto a fixed slot of the config tree.
    Knobs,
    /// Node sits under the named keyword, where slots are not fixed.
    Structural(&'static str),
}

struct Walker<'s> {
    root: &'s Value,
    registry: KnobRegistry,
    decls: Vec<KnobDecl>,
    violations: Vec<Violation>,
}

fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

impl<'s> Walker<'s> {
    fn authoring(&mut self, location: &Location, schema_path: String, message: impl Into<String>) {
        self.violations.push(Violation {
            instance_path: location.pointer(),
            schema_path,
            message: message.into(),
        });
    }

    /// Translate one schema node, registering any knob it declares.
    fn node(
        &mut self,
        schema: &Value,
        schema_path: &str,
        location: &Location,
        scope: Scope,
        ref_depth: usize,
    ) -> Value {
        let obj = match schema {
            Value::Bool(_) => return schema.clone(),
            Value::Object(obj) => obj,
            _ => {
                self.authoring(
                    location,
                    schema_path.to_string(),
                    "schema node must be an object or a boolean",
                );
                return json!({});
            }
        };

        if let Some(reference) = obj.get("$ref") {
            return self.reference(obj, reference, schema_path, location, scope, ref_depth);
        }

        for key in obj.keys() {
            let k = key.as_str();
            if !SCHEMA_KEYWORDS.contains(&k)
                && !KNOB_KEYWORDS.contains(&k)
                && !DEFINITION_KEYWORDS.contains(&k)
            {
                self.authoring(
                    location,
                    format!("{schema_path}/{}", escape_pointer(k)),
                    format!("unknown keyword \"{k}\""),
                );
            }
        }

        let rule = self.declaration(obj, schema_path, location, scope);

        let mut out = Map::new();
        for (key, value) in obj {
            let k = key.as_str();
            let path = format!("{schema_path}/{}", escape_pointer(k));
            match k {
                _ if KNOB_KEYWORDS.contains(&k) || DEFINITION_KEYWORDS.contains(&k) => {}
                "errorMessage" => {}
                "properties" => {
                    let Some(props) = value.as_object() else {
                        self.authoring(location, path, "\"properties\" must be an object");
                        continue;
                    };
                    let mut translated = Map::new();
                    for (name, sub) in props {
                        let sub_path = format!("{path}/{}", escape_pointer(name));
                        let child = location.child(name.as_str());
                        translated.insert(name.clone(), self.node(sub, &sub_path, &child, scope, ref_depth));
                    }
                    out.insert(key.clone(), Value::Object(translated));
                }
                "allOf" => {
                    out.insert(key.clone(), self.list(value, &path, location, scope, ref_depth));
                }
                "anyOf" | "oneOf" => {
                    let scope = Scope::Structural(if k == "anyOf" { "anyOf" } else { "oneOf" });
                    out.insert(key.clone(), self.list(value, &path, location, scope, ref_depth));
                }
                "patternProperties" | "dependencies" => {
                    let scope = Scope::Structural(if k == "dependencies" {
                        "dependencies"
                    } else {
                        "patternProperties"
                    });
                    let Some(entries) = value.as_object() else {
                        self.authoring(location, path, format!("\"{k}\" must be an object"));
                        continue;
                    };
                    let mut translated = Map::new();
                    for (name, sub) in entries {
                        let sub_path = format!("{path}/{}", escape_pointer(name));
                        let node = match sub {
                            // Property dependencies are plain name lists.
                            Value::Array(_) => sub.clone(),
                            _ => self.node(sub, &sub_path, location, scope, ref_depth),
                        };
                        translated.insert(name.clone(), node);
                    }
                    out.insert(key.clone(), Value::Object(translated));
                }
                "items" if value.is_array() => {
                    out.insert(
                        key.clone(),
                        self.list(value, &path, location, Scope::Structural("items"), ref_depth),
                    );
                }
                "items" | "additionalItems" | "contains" | "additionalProperties"
                | "propertyNames" | "not" | "if" | "then" | "else" => {
                    let keyword = SCHEMA_KEYWORDS
                        .iter()
                        .copied()
                        .find(|s| *s == k)
                        .unwrap_or("items");
                    let translated =
                        self.node(value, &path, location, Scope::Structural(keyword), ref_depth);
                    out.insert(key.clone(), translated);
                }
                _ => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }

        if let Some(rule) = rule {
            match out.get_mut("allOf") {
                Some(Value::Array(all)) => all.push(rule),
                _ => {
                    out.insert("allOf".to_string(), Value::Array(vec![rule]));
                }
            }
        }
        Value::Object(out)
    }

    fn list(
        &mut self,
        value: &Value,
        path: &str,
        location: &Location,
        scope: Scope,
        ref_depth: usize,
    ) -> Value {
        let Some(items) = value.as_array() else {
            self.authoring(location, path.to_string(), "expected a list of schemas");
            return json!([]);
        };
        let translated = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.node(item, &format!("{path}/{i}"), location, scope, ref_depth))
            .collect();
        Value::Array(translated)
    }

    /// Inline a local `$ref`. Sibling keywords extend the referenced schema.
    fn reference(
        &mut self,
        obj: &Map<String, Value>,
        reference: &Value,
        schema_path: &str,
        location: &Location,
        scope: Scope,
        ref_depth: usize,
    ) -> Value {
        let path = format!("{schema_path}/$ref");
        let Some(pointer) = reference.as_str().and_then(|r| r.strip_prefix('#')) else {
            self.authoring(location, path, "only local references (\"#/...\") are supported");
            return json!({});
        };
        if ref_depth >= MAX_REF_DEPTH {
            self.authoring(
                location,
                path,
                format!("reference chain deeper than {MAX_REF_DEPTH}; is \"#{pointer}\" cyclic?"),
            );
            return json!({});
        }
        let root = self.root;
        let mut merged = match root.pointer(pointer) {
            Some(Value::Object(target)) => target.clone(),
            Some(target @ Value::Bool(_)) if obj.len() == 1 => return target.clone(),
            Some(_) => {
                self.authoring(location, path, format!("\"#{pointer}\" is not a schema object"));
                return json!({});
            }
            None => {
                self.authoring(location, path, format!("cannot resolve reference \"#{pointer}\""));
                return json!({});
            }
        };
        for (key, value) in obj {
            if key != "$ref" {
                merged.insert(key.clone(), value.clone());
            }
        }
        self.node(&Value::Object(merged), schema_path, location, scope, ref_depth + 1)
    }

    /// Interpret the knob keywords on one node. Returns the value rule to
    /// add to the structural schema, if the node declares a kind.
    fn declaration(
        &mut self,
        obj: &Map<String, Value>,
        schema_path: &str,
        location: &Location,
        scope: Scope,
    ) -> Option<Value> {
        let present: Vec<&str> = KNOB_KEYWORDS
            .iter()
            .copied()
            .filter(|k| obj.contains_key(*k))
            .collect();
        if present.is_empty() {
            return None;
        }
        let at = |keyword: &str| format!("{schema_path}/{keyword}");

        if let Scope::Structural(keyword) = scope {
            self.authoring(
                location,
                at(present[0]),
                format!("knob declarations are not allowed inside \"{keyword}\""),
            );
            return None;
        }

        let kind = match obj.get("metaType") {
            Some(Value::String(tag)) => match KnobKind::from_str(tag) {
                Ok(kind) => kind,
                Err(e) => {
                    self.authoring(location, at("metaType"), e.to_string());
                    return None;
                }
            },
            Some(_) => {
                self.authoring(location, at("metaType"), "\"metaType\" must be a string");
                return None;
            }
            None => {
                let message = if obj.contains_key("config") {
                    "metaType is not set".to_string()
                } else if obj.contains_key("choice") {
                    "\"choice\" requires metaType \"boolChoice\"".to_string()
                } else {
                    format!("\"{}\" requires a config name", present[0])
                };
                self.authoring(location, at(present[0]), message);
                return None;
            }
        };

        // The root is the config document itself; it has no slot to hold a
        // value or a choice selector.
        if location.is_root() && (kind.is_value_kind() || kind == KnobKind::BoolChoice) {
            self.authoring(
                location,
                at("metaType"),
                format!("metaType \"{kind}\" must be declared on a property, not on the schema root"),
            );
            return None;
        }

        let name = match obj.get("config") {
            None => None,
            Some(Value::String(name)) => Some(name.clone()),
            Some(_) => {
                self.authoring(location, at("config"), "\"config\" must be a string");
                return None;
            }
        };
        let make_only = match obj.get("makeOnly") {
            None => false,
            Some(Value::Bool(b)) => *b,
            Some(_) => {
                self.authoring(location, at("makeOnly"), "\"makeOnly\" must be a boolean");
                false
            }
        };
        let depends = match obj.get("depends") {
            None => None,
            Some(Value::String(expr)) => Some(expr.clone()),
            Some(_) => {
                self.authoring(location, at("depends"), "\"depends\" must be an expression string");
                None
            }
        };
        let select = match obj.get("select").map(parse_select) {
            None => Vec::new(),
            Some(Ok(select)) => select,
            Some(Err(message)) => {
                self.authoring(location, at("select"), message);
                Vec::new()
            }
        };
        if kind != KnobKind::BoolChoice && obj.contains_key("choice") {
            self.authoring(location, at("choice"), "\"choice\" requires metaType \"boolChoice\"");
        }

        let mut decl = KnobDecl {
            name: None,
            kind,
            location: location.clone(),
            schema_path: schema_path.to_string(),
            members: Vec::new(),
            depends,
            select,
        };

        match kind {
            KnobKind::Int
            | KnobKind::Hex
            | KnobKind::Oct
            | KnobKind::Str
            | KnobKind::Bool
            | KnobKind::Tristate => {
                let Some(name) = name else {
                    self.authoring(
                        location,
                        at("metaType"),
                        format!("metaType \"{kind}\" declares a value but has no config name"),
                    );
                    return None;
                };
                if !obj.contains_key("default") {
                    self.authoring(location, at("config"), format!("config \"{name}\" requires a default"));
                }
                if self.register(&name, location, kind, None, make_only, schema_path) {
                    decl.name = Some(name);
                    self.decls.push(decl);
                }
                Some(kind.value_rule(&[]))
            }
            KnobKind::BoolChoice => {
                if name.is_some() {
                    self.authoring(
                        location,
                        at("config"),
                        "boolChoice names its members in \"choice\"; \"config\" is not allowed",
                    );
                }
                if decl.depends.is_some() || !decl.select.is_empty() {
                    self.authoring(
                        location,
                        at(if decl.depends.is_some() { "depends" } else { "select" }),
                        "boolChoice groups cannot carry \"depends\" or \"select\"",
                    );
                }
                let table = match obj.get("choice") {
                    Some(Value::Object(table)) if !table.is_empty() => table,
                    Some(Value::Object(_)) => {
                        self.authoring(location, at("choice"), "choice table is empty");
                        return None;
                    }
                    Some(_) => {
                        self.authoring(location, at("choice"), "\"choice\" must map keys to knob names");
                        return None;
                    }
                    None => {
                        self.authoring(location, at("metaType"), "boolChoice requires a \"choice\" table");
                        return None;
                    }
                };
                let mut keys = Vec::with_capacity(table.len());
                for (key, member) in table {
                    keys.push(key.as_str());
                    let Some(member) = member.as_str() else {
                        self.authoring(
                            location,
                            format!("{}/{}", at("choice"), escape_pointer(key)),
                            format!("choice \"{key}\" must name a knob"),
                        );
                        continue;
                    };
                    if self.register(member, location, kind, Some(key.as_str()), make_only, schema_path) {
                        decl.members.push(member.to_string());
                    }
                }
                self.decls.push(decl);
                Some(kind.value_rule(&keys))
            }
            KnobKind::Menu => {
                if name.is_some() || make_only || decl.depends.is_some() || !decl.select.is_empty() {
                    self.authoring(
                        location,
                        at(present[0]),
                        "menu carries no value; use menuconfig to name it",
                    );
                }
                Some(kind.value_rule(&[]))
            }
            KnobKind::Menuconfig => {
                match name {
                    Some(name) => {
                        let slot = location.child("enabled");
                        if self.register(&name, &slot, kind, None, make_only, schema_path) {
                            decl.name = Some(name);
                            decl.location = slot;
                            self.decls.push(decl);
                        }
                    }
                    None if make_only || decl.depends.is_some() || !decl.select.is_empty() => {
                        self.authoring(
                            location,
                            at(present[0]),
                            format!("\"{}\" requires a config name", present[0]),
                        );
                    }
                    None => {}
                }
                Some(kind.value_rule(&[]))
            }
        }
    }

    /// Register a knob; a duplicate name is reported at the offending
    /// declaration. Returns whether the knob was registered.
    fn register(
        &mut self,
        name: &str,
        location: &Location,
        kind: KnobKind,
        choice: Option<&str>,
        make_only: bool,
        schema_path: &str,
    ) -> bool {
        let entry = KnobEntry {
            name: name.to_string(),
            location: location.clone(),
            kind,
            choice: choice.map(str::to_string),
            make_only,
        };
        match self.registry.register(entry) {
            Ok(()) => true,
            Err(e) => {
                let keyword = if choice.is_some() { "choice" } else { "config" };
                self.authoring(location, format!("{schema_path}/{keyword}"), e.to_string());
                false
            }
        }
    }
}
