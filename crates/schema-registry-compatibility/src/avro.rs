//! Avro compatibility rules (component C4): field-default and type-promotion
//! based schema resolution, the same rule set `apache_avro` itself applies
//! when a reader schema decodes data written under a writer schema.

use schema_registry_core::{Direction, FormatCompatibilityChecker, ParsedSchema, SchemaType, Violation};

pub struct AvroCompatibilityChecker;

impl AvroCompatibilityChecker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AvroCompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Avro's primitive promotion table: a writer value of the left type can
/// always be read as the right type.
fn promotes_to(writer_type: &str, reader_type: &str) -> bool {
    matches!(
        (writer_type, reader_type),
        ("int", "long")
            | ("int", "float")
            | ("int", "double")
            | ("long", "float")
            | ("long", "double")
            | ("float", "double")
            | ("string", "bytes")
            | ("bytes", "string")
    )
}

fn types_compatible(writer_type: &str, reader_type: &str) -> bool {
    writer_type == reader_type || promotes_to(writer_type, reader_type)
}

/// `reader` decodes data produced by `writer`. Used for both directions: for
/// BACKWARD, `reader` is the new schema and `writer` is the old one; for
/// FORWARD the roles are swapped by the caller.
fn evolution_violations(reader: &ParsedSchema, writer: &ParsedSchema, direction: Direction) -> Vec<Violation> {
    let mut violations = Vec::new();

    if reader.name != writer.name || reader.namespace != writer.namespace {
        violations.push(Violation {
            direction,
            path: reader.name.clone().unwrap_or_default(),
            message: format!(
                "record name/namespace changed from '{}.{}' to '{}.{}', which Avro schema resolution cannot match",
                writer.namespace.as_deref().unwrap_or(""),
                writer.name.as_deref().unwrap_or(""),
                reader.namespace.as_deref().unwrap_or(""),
                reader.name.as_deref().unwrap_or(""),
            ),
        });
    }

    for rf in &reader.fields {
        match writer.field(&rf.name) {
            None => {
                if !rf.has_default {
                    violations.push(Violation {
                        direction,
                        path: rf.name.clone(),
                        message: format!(
                            "field '{}' was added without a default and is missing from the schema it must read",
                            rf.name
                        ),
                    });
                }
            }
            Some(wf) if !types_compatible(&wf.type_name, &rf.type_name) => {
                violations.push(Violation {
                    direction,
                    path: rf.name.clone(),
                    message: format!(
                        "field '{}' changed type from '{}' to '{}', which Avro cannot promote",
                        rf.name, wf.type_name, rf.type_name
                    ),
                });
            }
            Some(_) => {}
        }
    }

    if !writer.enum_symbols.is_empty() || !reader.enum_symbols.is_empty() {
        for symbol in &writer.enum_symbols {
            if !reader.enum_symbols.contains(symbol) {
                violations.push(Violation {
                    direction,
                    path: symbol.clone(),
                    message: format!("enum symbol '{symbol}' was removed"),
                });
            }
        }
    }

    violations
}

impl FormatCompatibilityChecker for AvroCompatibilityChecker {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Avro
    }

    fn check(&self, old: &ParsedSchema, new: &ParsedSchema, direction: Direction) -> Vec<Violation> {
        match direction {
            Direction::Backward => evolution_violations(new, old, direction),
            Direction::Forward => evolution_violations(old, new, direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_registry_core::ParsedField;

    fn schema(fields: Vec<ParsedField>) -> ParsedSchema {
        ParsedSchema {
            schema_type: SchemaType::Avro,
            name: Some("Test".into()),
            namespace: None,
            fields,
            enum_symbols: Vec::new(),
            reserved_numbers: Vec::new(),
            reserved_names: Vec::new(),
            canonical_text: "{}".into(),
        }
    }

    fn field(name: &str, type_name: &str, has_default: bool) -> ParsedField {
        ParsedField {
            name: name.into(),
            type_name: type_name.into(),
            number: None,
            has_default,
            default_value: None,
            required: !has_default,
        }
    }

    #[test]
    fn adding_field_without_default_breaks_backward_compatibility() {
        let old = schema(vec![field("id", "long", false)]);
        let new = schema(vec![field("id", "long", false), field("name", "string", false)]);
        let checker = AvroCompatibilityChecker::new();
        let violations = checker.check(&old, &new, Direction::Backward);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "name");
    }

    #[test]
    fn adding_field_with_default_is_backward_compatible() {
        let old = schema(vec![field("id", "long", false)]);
        let new = schema(vec![field("id", "long", false), field("name", "string", true)]);
        let checker = AvroCompatibilityChecker::new();
        assert!(checker.check(&old, &new, Direction::Backward).is_empty());
    }

    #[test]
    fn int_to_long_promotion_is_compatible() {
        let old = schema(vec![field("count", "int", false)]);
        let new = schema(vec![field("count", "long", false)]);
        let checker = AvroCompatibilityChecker::new();
        assert!(checker.check(&old, &new, Direction::Backward).is_empty());
    }

    #[test]
    fn narrowing_type_is_incompatible() {
        let old = schema(vec![field("count", "long", false)]);
        let new = schema(vec![field("count", "int", false)]);
        let checker = AvroCompatibilityChecker::new();
        assert!(!checker.check(&old, &new, Direction::Backward).is_empty());
    }

    #[test]
    fn renaming_record_breaks_backward_compatibility() {
        let old = schema(vec![field("id", "long", false)]);
        let mut new = schema(vec![field("id", "long", false)]);
        new.name = Some("Renamed".into());
        let checker = AvroCompatibilityChecker::new();
        let violations = checker.check(&old, &new, Direction::Backward);
        assert!(violations.iter().any(|v| v.message.contains("record name")));
    }

    #[test]
    fn changing_namespace_breaks_forward_compatibility() {
        let old = schema(vec![field("id", "long", false)]);
        let mut new = schema(vec![field("id", "long", false)]);
        new.namespace = Some("com.other".into());
        let checker = AvroCompatibilityChecker::new();
        let violations = checker.check(&old, &new, Direction::Forward);
        assert!(violations.iter().any(|v| v.message.contains("namespace")));
    }

    #[test]
    fn adding_enum_symbol_breaks_forward_compatibility() {
        let mut old = schema(vec![]);
        old.enum_symbols = vec!["A".into()];
        let mut new = schema(vec![]);
        new.enum_symbols = vec!["A".into(), "B".into()];
        let checker = AvroCompatibilityChecker::new();
        assert!(!checker.check(&old, &new, Direction::Forward).is_empty());
    }
}
