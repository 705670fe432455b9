//! # Compiler Entry Point
//!
//! [`KnobSchema`] is built once from an extended schema document and can
//! then compile any number of config documents. Each [`KnobSchema::compile`]
//! call works on its own deep copy of the config; nothing is shared between
//! calls.
//!
//! ## Pipeline
//!
//! ```text
//! config ──► normalize ──► structural validation ──► select
//!                                                      │
//!        artifacts ◄── generate ◄── depends ◄── declared set
//! ```
//!
//! The tree is normalized again after selections so that objects created
//! by a selection receive their defaults.

use knob_core::KnobRegistry;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codegen::{generate, Artifacts};
use crate::declaration::{declare, KnobDecl};
use crate::error::{CompileError, ValidationViolations, Violation};
use crate::resolve::{apply_selections, check_dependencies, check_selections, declared_knobs};
use crate::validate::ConfigValidator;

/// A validated extended schema, ready to compile configs.
#[derive(Debug)]
pub struct KnobSchema {
    registry: KnobRegistry,
    decls: Vec<KnobDecl>,
    validator: ConfigValidator,
}

/// Result of a successful compile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileOutput {
    /// Every registered knob name, in declaration order.
    pub knobs: Vec<String>,
    /// The resolved config tree.
    pub config: Value,
    /// Build-listing text.
    pub makefile: String,
    /// Header text.
    pub header: String,
}

impl KnobSchema {
    /// Walk and check an extended schema document.
    ///
    /// # Errors
    ///
    /// `CompileError::SchemaInvalid` for authoring errors, including
    /// `select` targets that are not registered;
    /// `CompileError::ValidatorBuild` if the structural schema is rejected.
    pub fn from_schema(schema: &Value) -> Result<Self, CompileError> {
        let declarations = declare(schema)?;
        let violations = check_selections(&declarations.decls, &declarations.registry);
        if !violations.is_empty() {
            return Err(CompileError::SchemaInvalid {
                violations: ValidationViolations::new(violations),
            });
        }
        let validator = ConfigValidator::new(declarations.structural)?;
        debug!(
            knobs = declarations.registry.len(),
            declarations = declarations.decls.len(),
            "schema loaded"
        );
        Ok(Self {
            registry: declarations.registry,
            decls: declarations.decls,
            validator,
        })
    }

    /// The knob registry.
    pub fn registry(&self) -> &KnobRegistry {
        &self.registry
    }

    /// Knob declarations in document order.
    pub fn declarations(&self) -> &[KnobDecl] {
        &self.decls
    }

    /// The plain JSON Schema the config is structurally validated against.
    pub fn structural_schema(&self) -> &Value {
        self.validator.schema()
    }

    /// Compile one config document.
    ///
    /// # Errors
    ///
    /// `ValidationFailed`, `Expression`, `DependenciesFailed` or, for a
    /// resolver defect, `MissingValue`. No partial output accompanies an
    /// error.
    pub fn compile(&self, config: &Value) -> Result<CompileOutput, CompileError> {
        let mut tree = config.clone();

        self.normalize(&mut tree)?;
        let written = apply_selections(&self.decls, &self.registry, &mut tree)?;
        if written > 0 {
            self.normalize(&mut tree)?;
        }

        let declared = declared_knobs(&self.decls, &self.registry, &tree).map_err(failed)?;
        debug!(declared = declared.len(), "declared set built");
        check_dependencies(&declared, &self.registry, &tree)?;

        let names = declared.iter().flat_map(|d| d.names());
        let Artifacts { makefile, header } = generate(&self.registry, names, &tree)?;
        debug!(
            makefile_lines = makefile.lines().count(),
            header_lines = header.lines().count(),
            "artifacts generated"
        );

        Ok(CompileOutput {
            knobs: self.registry.names().map(str::to_string).collect(),
            config: tree,
            makefile,
            header,
        })
    }

    fn normalize(&self, tree: &mut Value) -> Result<(), CompileError> {
        for location in self.validator.normalize(tree) {
            warn!(field = %location, "unknown config field removed");
        }
        let violations = self.validator.violations(tree);
        debug!(violations = violations.len(), "structural validation");
        if violations.is_empty() {
            Ok(())
        } else {
            Err(failed(violations))
        }
    }
}

fn failed(violations: Vec<Violation>) -> CompileError {
    CompileError::ValidationFailed {
        violations: ValidationViolations::new(violations),
    }
}

/// Build a [`KnobSchema`] from `schema` and compile `config` against it.
///
/// # Errors
///
/// Any error of [`KnobSchema::from_schema`] or [`KnobSchema::compile`].
pub fn compile(schema: &Value, config: &Value) -> Result<CompileOutput, CompileError> {
    KnobSchema::from_schema(schema)?.compile(config)
}
