//! JSON Schema compatibility rules (component C4), adapted from the
//! registry's own `JsonSchemaCompatibilityChecker`: property presence,
//! `required`-ness and a small numeric-widening table, since `ParsedField`
//! does not carry raw keyword-level constraints (`minLength`, `pattern`,
//! ...) to compare beyond that.

use schema_registry_core::{Direction, FormatCompatibilityChecker, ParsedSchema, SchemaType, Violation};

pub struct JsonSchemaCompatibilityChecker;

impl JsonSchemaCompatibilityChecker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonSchemaCompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn types_compatible(writer_type: &str, reader_type: &str) -> bool {
    writer_type == reader_type || matches!((writer_type, reader_type), ("integer", "number"))
}

/// `reader` validates instances produced against `writer`.
fn evolution_violations(reader: &ParsedSchema, writer: &ParsedSchema, direction: Direction) -> Vec<Violation> {
    let mut violations = Vec::new();

    for rf in &reader.fields {
        if rf.required {
            match writer.field(&rf.name) {
                None => violations.push(Violation {
                    direction,
                    path: rf.name.clone(),
                    message: format!(
                        "field '{}' is required but is not present in the other schema",
                        rf.name
                    ),
                }),
                Some(wf) if !wf.required => violations.push(Violation {
                    direction,
                    path: rf.name.clone(),
                    message: format!(
                        "field '{}' is required but was only optional in the other schema",
                        rf.name
                    ),
                }),
                Some(_) => {}
            }
        }

        if let Some(wf) = writer.field(&rf.name) {
            if !types_compatible(&wf.type_name, &rf.type_name) {
                violations.push(Violation {
                    direction,
                    path: rf.name.clone(),
                    message: format!(
                        "field '{}' changed type from '{}' to '{}'",
                        rf.name, wf.type_name, rf.type_name
                    ),
                });
            }
        }
    }

    violations
}

impl FormatCompatibilityChecker for JsonSchemaCompatibilityChecker {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Json
    }

    fn check(&self, old: &ParsedSchema, new: &ParsedSchema, direction: Direction) -> Vec<Violation> {
        match direction {
            Direction::Backward => evolution_violations(new, old, direction),
            Direction::Forward => evolution_violations(old, new, direction),
        }
    }
}
