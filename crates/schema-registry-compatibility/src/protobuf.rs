//! Protobuf compatibility rules (component C4), adapted from the registry's
//! own wire-compatibility rule set: fields are matched by number, not by
//! name, and a number can only be retired through `reserved`.

use schema_registry_core::{Direction, FormatCompatibilityChecker, ParsedField, ParsedSchema, SchemaType, Violation};

pub struct ProtobufCompatibilityChecker;

impl ProtobufCompatibilityChecker {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProtobufCompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Scalar types the wire format encodes identically; swapping within a group
/// does not change how bytes on the wire are interpreted by old readers.
fn wire_compatible(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    const VARINT_GROUP: &[&str] = &["int32", "uint32", "int64", "uint64", "bool"];
    const LENGTH_DELIMITED_GROUP: &[&str] = &["string", "bytes"];
    (VARINT_GROUP.contains(&a) && VARINT_GROUP.contains(&b))
        || (LENGTH_DELIMITED_GROUP.contains(&a) && LENGTH_DELIMITED_GROUP.contains(&b))
}

fn field_by_number(fields: &[ParsedField], number: u32) -> Option<&ParsedField> {
    fields.iter().find(|f| f.number == Some(number))
}

/// `reader` decodes messages produced by `writer`.
fn evolution_violations(reader: &ParsedSchema, writer: &ParsedSchema, direction: Direction) -> Vec<Violation> {
    let mut violations = Vec::new();

    for wf in &writer.fields {
        let Some(number) = wf.number else { continue };
        match field_by_number(&reader.fields, number) {
            None => {
                let number_reserved = reader
                    .reserved_numbers
                    .iter()
                    .any(|(start, end)| number >= *start && number <= *end);
                let name_reserved = reader.reserved_names.iter().any(|n| n == &wf.name);
                if !number_reserved || !name_reserved {
                    let missing = match (number_reserved, name_reserved) {
                        (false, false) => "its number and name",
                        (false, true) => "its number",
                        (true, false) => "its name",
                        (true, true) => unreachable!(),
                    };
                    violations.push(Violation {
                        direction,
                        path: format!("field #{number}"),
                        message: format!(
                            "field '{}' (number {number}) was removed without reserving {missing}",
                            wf.name
                        ),
                    });
                }
            }
            Some(rf) => {
                if !wire_compatible(&wf.type_name, &rf.type_name) {
                    violations.push(Violation {
                        direction,
                        path: rf.name.clone(),
                        message: format!(
                            "field number {number} changed type from '{}' to '{}'",
                            wf.type_name, rf.type_name
                        ),
                    });
                } else if wf.name != rf.name {
                    violations.push(Violation {
                        direction,
                        path: rf.name.clone(),
                        message: format!(
                            "field number {number} was renamed from '{}' to '{}'",
                            wf.name, rf.name
                        ),
                    });
                }
                if rf.required && !wf.required {
                    violations.push(Violation {
                        direction,
                        path: rf.name.clone(),
                        message: format!("field '{}' became required", rf.name),
                    });
                }
            }
        }
    }

    violations
}

impl FormatCompatibilityChecker for ProtobufCompatibilityChecker {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Protobuf
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

    fn schema(fields: Vec<ParsedField>, reserved: Vec<(u32, u32)>) -> ParsedSchema {
        schema_with_reserved_names(fields, reserved, vec![])
    }

    fn schema_with_reserved_names(
        fields: Vec<ParsedField>,
        reserved: Vec<(u32, u32)>,
        reserved_names: Vec<String>,
    ) -> ParsedSchema {
        ParsedSchema {
            schema_type: SchemaType::Protobuf,
            name: Some("Test".into()),
            namespace: None,
            fields,
            enum_symbols: Vec::new(),
            reserved_numbers: reserved,
            reserved_names,
            canonical_text: "".into(),
        }
    }

    fn field(name: &str, type_name: &str, number: u32, required: bool) -> ParsedField {
        ParsedField {
            name: name.into(),
            type_name: type_name.into(),
            number: Some(number),
            has_default: false,
            default_value: None,
            required,
        }
    }

    #[test]
    fn removing_field_without_reservation_is_breaking() {
        let old = schema(vec![field("id", "int64", 1, false)], vec![]);
        let new = schema(vec![], vec![]);
        let checker = ProtobufCompatibilityChecker::new();
        assert!(!checker.check(&old, &new, Direction::Backward).is_empty());
    }

    #[test]
    fn removing_field_with_number_and_name_reservation_is_compatible() {
        let old = schema(vec![field("id", "int64", 1, false)], vec![]);
        let new = schema_with_reserved_names(vec![], vec![(1, 1)], vec!["id".into()]);
        let checker = ProtobufCompatibilityChecker::new();
        assert!(checker.check(&old, &new, Direction::Backward).is_empty());
    }

    #[test]
    fn removing_field_with_only_number_reserved_is_breaking() {
        let old = schema(vec![field("id", "int64", 1, false)], vec![]);
        let new = schema(vec![], vec![(1, 1)]);
        let checker = ProtobufCompatibilityChecker::new();
        let violations = checker.check(&old, &new, Direction::Backward);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("its name"));
    }

    #[test]
    fn removing_field_with_only_name_reserved_is_breaking() {
        let old = schema(vec![field("id", "int64", 1, false)], vec![]);
        let new = schema_with_reserved_names(vec![], vec![], vec!["id".into()]);
        let checker = ProtobufCompatibilityChecker::new();
        let violations = checker.check(&old, &new, Direction::Backward);
        assert!(!violations.is_empty());
        assert!(violations[0].message.contains("its number"));
    }

    #[test]
    fn changing_field_number_type_across_incompatible_wire_groups_is_breaking() {
        let old = schema(vec![field("id", "int64", 1, false)], vec![]);
        let new = schema(vec![field("id", "double", 1, false)], vec![]);
        let checker = ProtobufCompatibilityChecker::new();
        assert!(!checker.check(&old, &new, Direction::Backward).is_empty());
    }

    #[test]
    fn varint_widening_is_compatible() {
        let old = schema(vec![field("id", "int32", 1, false)], vec![]);
        let new = schema(vec![field("id", "int64", 1, false)], vec![]);
        let checker = ProtobufCompatibilityChecker::new();
        assert!(checker.check(&old, &new, Direction::Backward).is_empty());
    }

    #[test]
    fn making_field_required_is_breaking() {
        let old = schema(vec![field("id", "int64", 1, false)], vec![]);
        let new = schema(vec![field("id", "int64", 1, true)], vec![]);
        let checker = ProtobufCompatibilityChecker::new();
        assert!(!checker.check(&old, &new, Direction::Backward).is_empty());
    }
}
