//! JSON Schema parser (component C2).

use jsonschema::{Draft, JSONSchema};
use schema_registry_core::{canonicalize, Error, ParsedField, ParsedSchema, Result, SchemaParser, SchemaType};
use serde_json::Value;

pub struct JsonSchemaParser {
    draft: Draft,
}

impl JsonSchemaParser {
    pub fn new() -> Self {
        Self { draft: Draft::Draft7 }
    }

    pub fn with_draft(draft: Draft) -> Self {
        Self { draft }
    }

    fn extract_fields(schema: &Value) -> Vec<ParsedField> {
        let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
            return Vec::new();
        };
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        properties
            .iter()
            .map(|(name, prop)| {
                let type_name = prop
                    .get("type")
                    .map(type_name_of)
                    .unwrap_or_else(|| "any".to_string());
                let default_value = prop.get("default").cloned();
                ParsedField {
                    name: name.clone(),
                    type_name,
                    number: None,
                    has_default: default_value.is_some(),
                    default_value,
                    required: required.contains(&name.as_str()),
                }
            })
            .collect()
    }
}

fn type_name_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(types) => {
            let names: Vec<String> = types.iter().map(type_name_of).collect();
            names.join("|")
        }
        other => other.to_string(),
    }
}

impl Default for JsonSchemaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaParser for JsonSchemaParser {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Json
    }

    fn parse(&self, text: &str) -> Result<ParsedSchema> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::InvalidSchema(format!("invalid JSON: {e}")))?;

        JSONSchema::options()
            .with_draft(self.draft)
            .compile(&value)
            .map_err(|e| Error::InvalidSchema(format!("invalid JSON Schema: {e}")))?;

        let name = value
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                value
                    .get("$id")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });

        let fields = Self::extract_fields(&value);
        let canonical_text = canonicalize(SchemaType::Json, text)?;

        Ok(ParsedSchema {
            schema_type: SchemaType::Json,
            name,
            namespace: None,
            fields,
            enum_symbols: Vec::new(),
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
    fn parses_required_and_optional_fields() {
        let parser = JsonSchemaParser::new();
        let schema = r#"{
            "title": "User",
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": "string"}
            },
            "required": ["id"]
        }"#;

        let parsed = parser.parse(schema).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("User"));
        assert!(parsed.field("id").unwrap().required);
        assert!(!parsed.field("name").unwrap().required);
    }

    #[test]
    fn rejects_invalid_meta_schema() {
        let parser = JsonSchemaParser::new();
        let schema = r#"{"type": "not-a-real-type"}"#;
        assert!(parser.parse(schema).is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        let parser = JsonSchemaParser::new();
        assert!(parser.parse("{ not json }").is_err());
    }

    #[test]
    fn default_value_marks_field_as_having_default() {
        let parser = JsonSchemaParser::new();
        let schema = r#"{
            "type": "object",
            "properties": {"count": {"type": "integer", "default": 0}}
        }"#;
        let parsed = parser.parse(schema).unwrap();
        assert!(parsed.field("count").unwrap().has_default);
    }
}
