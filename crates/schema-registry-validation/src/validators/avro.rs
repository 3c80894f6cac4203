//! Apache Avro schema parser (component C2).

use apache_avro::schema::RecordField;
use apache_avro::Schema as AvroSchema;
use schema_registry_core::{
    canonicalize, Error, ParsedField, ParsedSchema, Result, SchemaParser, SchemaType,
};

pub struct AvroParser;

impl AvroParser {
    pub fn new() -> Self {
        Self
    }

    fn parsed_field(field: &RecordField) -> ParsedField {
        let has_default = field.default.is_some();
        ParsedField {
            name: field.name.clone(),
            type_name: type_name(&field.schema),
            number: None,
            has_default,
            default_value: field.default.clone(),
            required: !has_default && !is_nullable(&field.schema),
        }
    }

    /// Walks the top-level schema shape into a flat `ParsedSchema`. Nested
    /// records inside fields are only summarized by their type name; the
    /// compatibility checker re-parses referenced record schemas on its own
    /// when it needs to recurse.
    fn describe(schema: &AvroSchema) -> (Option<String>, Option<String>, Vec<ParsedField>, Vec<String>) {
        match schema {
            AvroSchema::Record(record) => {
                let fields = record.fields.iter().map(Self::parsed_field).collect();
                (
                    Some(record.name.name.clone()),
                    record.name.namespace.clone(),
                    fields,
                    Vec::new(),
                )
            }
            AvroSchema::Enum(e) => (
                Some(e.name.name.clone()),
                e.name.namespace.clone(),
                Vec::new(),
                e.symbols.clone(),
            ),
            AvroSchema::Fixed(f) => (Some(f.name.name.clone()), f.name.namespace.clone(), Vec::new(), Vec::new()),
            _ => (None, None, Vec::new(), Vec::new()),
        }
    }
}

impl Default for AvroParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_nullable(schema: &AvroSchema) -> bool {
    match schema {
        AvroSchema::Null => true,
        AvroSchema::Union(u) => u.variants().iter().any(|v| matches!(v, AvroSchema::Null)),
        _ => false,
    }
}

fn type_name(schema: &AvroSchema) -> String {
    match schema {
        AvroSchema::Null => "null".to_string(),
        AvroSchema::Boolean => "boolean".to_string(),
        AvroSchema::Int => "int".to_string(),
        AvroSchema::Long => "long".to_string(),
        AvroSchema::Float => "float".to_string(),
        AvroSchema::Double => "double".to_string(),
        AvroSchema::Bytes => "bytes".to_string(),
        AvroSchema::String => "string".to_string(),
        AvroSchema::Array(inner) => format!("array<{}>", type_name(inner)),
        AvroSchema::Map(inner) => format!("map<{}>", type_name(inner)),
        AvroSchema::Union(u) => {
            let names: Vec<String> = u.variants().iter().map(type_name).collect();
            format!("union[{}]", names.join(","))
        }
        AvroSchema::Record(r) => r.name.fullname(None),
        AvroSchema::Enum(e) => e.name.fullname(None),
        AvroSchema::Fixed(f) => f.name.fullname(None),
        AvroSchema::Decimal(_) => "decimal".to_string(),
        AvroSchema::Uuid => "uuid".to_string(),
        AvroSchema::Date => "date".to_string(),
        AvroSchema::TimeMillis => "time-millis".to_string(),
        AvroSchema::TimeMicros => "time-micros".to_string(),
        AvroSchema::TimestampMillis => "timestamp-millis".to_string(),
        AvroSchema::TimestampMicros => "timestamp-micros".to_string(),
        AvroSchema::Duration => "duration".to_string(),
        AvroSchema::Ref { name } => name.fullname(None),
        _ => "unknown".to_string(),
    }
}

/// Structural checks beyond what `apache_avro` itself rejects while parsing:
/// empty records/enums and duplicate field or symbol names are syntactically
/// valid JSON but not a usable Avro schema.
fn validate_structure(schema: &AvroSchema) -> Result<()> {
    match schema {
        AvroSchema::Record(record) => {
            let mut seen = std::collections::HashSet::new();
            for field in &record.fields {
                if !seen.insert(&field.name) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate field '{}' in record '{}'",
                        field.name,
                        record.name.fullname(None)
                    )));
                }
            }
            for field in &record.fields {
                validate_structure(&field.schema)?;
            }
            Ok(())
        }
        AvroSchema::Enum(e) => {
            if e.symbols.is_empty() {
                return Err(Error::InvalidSchema(format!(
                    "enum '{}' has no symbols",
                    e.name.fullname(None)
                )));
            }
            let mut seen = std::collections::HashSet::new();
            for symbol in &e.symbols {
                if !seen.insert(symbol) {
                    return Err(Error::InvalidSchema(format!(
                        "duplicate symbol '{symbol}' in enum '{}'",
                        e.name.fullname(None)
                    )));
                }
            }
            Ok(())
        }
        AvroSchema::Fixed(f) => {
            if f.size == 0 {
                return Err(Error::InvalidSchema(format!(
                    "fixed type '{}' has zero size",
                    f.name.fullname(None)
                )));
            }
            Ok(())
        }
        AvroSchema::Array(inner) | AvroSchema::Map(inner) => validate_structure(inner),
        AvroSchema::Union(u) => {
            for variant in u.variants() {
                validate_structure(variant)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

impl SchemaParser for AvroParser {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Avro
    }

    fn parse(&self, text: &str) -> Result<ParsedSchema> {
        let schema = AvroSchema::parse_str(text)
            .map_err(|e| Error::InvalidSchema(format!("invalid Avro schema: {e}")))?;
        validate_structure(&schema)?;

        let canonical_text = canonicalize(SchemaType::Avro, text)?;
        let (name, namespace, fields, enum_symbols) = Self::describe(&schema);

        Ok(ParsedSchema {
            schema_type: SchemaType::Avro,
            name,
            namespace,
            fields,
            enum_symbols,
            reserved_numbers: Vec::new(),
            reserved_names: Vec::new(),
            canonical_text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_fields() {
        let parser = AvroParser::new();
        let schema = r#"{
            "type": "record",
            "name": "User",
            "namespace": "com.example",
            "fields": [
                {"name": "id", "type": "long"},
                {"name": "username", "type": "string"}
            ]
        }"#;

        let parsed = parser.parse(schema).unwrap();
        assert_eq!(parsed.fully_qualified_name().unwrap(), "com.example.User");
        assert_eq!(parsed.fields.len(), 2);
        assert!(parsed.field("id").unwrap().required);
    }

    #[test]
    fn rejects_malformed_json() {
        let parser = AvroParser::new();
        assert!(parser.parse("{ not avro }").is_err());
    }

    #[test]
    fn rejects_duplicate_fields() {
        let parser = AvroParser::new();
        let schema = r#"{
            "type": "record",
            "name": "Dup",
            "fields": [
                {"name": "id", "type": "long"},
                {"name": "id", "type": "string"}
            ]
        }"#;
        let err = parser.parse(schema).unwrap_err();
        assert!(err.is_validation_error());
    }

    #[test]
    fn rejects_empty_enum() {
        let parser = AvroParser::new();
        let schema = r#"{"type": "enum", "name": "Status", "symbols": []}"#;
        assert!(parser.parse(schema).is_err());
    }

    #[test]
    fn field_with_default_is_not_required() {
        let parser = AvroParser::new();
        let schema = r#"{
            "type": "record",
            "name": "X",
            "fields": [{"name": "count", "type": "long", "default": 0}]
        }"#;
        let parsed = parser.parse(schema).unwrap();
        assert!(!parsed.field("count").unwrap().required);
        assert!(parsed.field("count").unwrap().has_default);
    }

    #[test]
    fn union_schema_parses_without_name() {
        let parser = AvroParser::new();
        let parsed = parser.parse(r#"["null", "string"]"#).unwrap();
        assert!(parsed.name.is_none());
    }
}
