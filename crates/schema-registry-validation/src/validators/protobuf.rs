//! Protocol Buffers schema parser (component C2).
//!
//! No full protobuf grammar here, same as the registry's own reference
//! parser: field declarations, message/enum boundaries and `reserved`
//! statements are pulled out with regexes, which is enough to produce the
//! `ParsedSchema` shape the compatibility checker needs.

use once_cell::sync::Lazy;
use regex::Regex;
use schema_registry_core::{Error, ParsedField, ParsedSchema, Result, SchemaParser, SchemaType};

static SYNTAX_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r#"syntax\s*=\s*"(proto[23])"\s*;"#).unwrap());
static MESSAGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"message\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{").unwrap());
static ENUM_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"enum\s+([A-Za-z_][A-Za-z0-9_]*)\s*\{").unwrap());
static PACKAGE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"package\s+([a-zA-Z_][a-zA-Z0-9_.]*)\s*;").unwrap());
static FIELD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(required|optional|repeated)?\s*([A-Za-z_][A-Za-z0-9_.]*)\s+([a-z][A-Za-z0-9_]*)\s*=\s*(\d+)\s*[;\[]").unwrap()
});
static ENUM_VALUE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*([A-Z][A-Z0-9_]*)\s*=\s*(-?\d+)\s*;").unwrap());
static RESERVED_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\breserved\s+([^;]+);"#).unwrap());

pub struct ProtobufParser;

impl ProtobufParser {
    pub fn new() -> Self {
        Self
    }

    /// Slice out the body of the first `message { ... }` block by brace
    /// counting; the regexes above only look within it.
    fn first_message_body(text: &str) -> Option<&str> {
        let m = MESSAGE_REGEX.find(text)?;
        Self::block_body_from(text, m.end() - 1)
    }

    /// Brace-count a `{ ... }` block starting at the byte offset of its
    /// opening brace, returning the body between the braces.
    fn block_body_from(text: &str, open: usize) -> Option<&str> {
        let mut depth = 0i32;
        for (i, c) in text[open..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[open + 1..open + i]);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn parse_fields(body: &str) -> Result<Vec<ParsedField>> {
        let mut fields = Vec::new();
        let mut seen_numbers = std::collections::HashSet::new();
        for cap in FIELD_REGEX.captures_iter(body) {
            let label = cap.get(1).map(|m| m.as_str());
            let type_name = cap[2].to_string();
            let name = cap[3].to_string();
            let number: u32 = cap[4]
                .parse()
                .map_err(|_| Error::InvalidSchema(format!("field number overflow for '{name}'")))?;

            if number == 0 {
                return Err(Error::InvalidSchema(format!("field '{name}' has field number 0")));
            }
            if (19000..=19999).contains(&number) {
                return Err(Error::InvalidSchema(format!(
                    "field '{name}' uses reserved number range (19000-19999): {number}"
                )));
            }
            if !seen_numbers.insert(number) {
                return Err(Error::InvalidSchema(format!("duplicate field number {number}")));
            }

            fields.push(ParsedField {
                name,
                type_name,
                number: Some(number),
                has_default: false,
                default_value: None,
                required: label == Some("required"),
            });
        }
        Ok(fields)
    }

    fn parse_reserved(body: &str) -> (Vec<(u32, u32)>, Vec<String>) {
        let mut numbers = Vec::new();
        let mut names = Vec::new();
        for cap in RESERVED_REGEX.captures_iter(body) {
            let clause = cap[1].trim();
            if clause.starts_with('"') {
                for part in clause.split(',') {
                    names.push(part.trim().trim_matches('"').to_string());
                }
                continue;
            }
            for part in clause.split(',') {
                let part = part.trim();
                if let Some((start, end)) = part.split_once("to") {
                    if let (Ok(start), Ok(end)) = (start.trim().parse(), end.trim().parse()) {
                        numbers.push((start, end));
                    }
                } else if let Ok(n) = part.parse::<u32>() {
                    numbers.push((n, n));
                }
            }
        }
        (numbers, names)
    }
}

impl Default for ProtobufParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaParser for ProtobufParser {
    fn schema_type(&self) -> SchemaType {
        SchemaType::Protobuf
    }

    fn parse(&self, text: &str) -> Result<ParsedSchema> {
        if let Some(cap) = SYNTAX_REGEX.captures(text) {
            let syntax = &cap[1];
            if syntax != "proto2" && syntax != "proto3" {
                return Err(Error::InvalidSchema(format!("unsupported proto syntax '{syntax}'")));
            }
        }

        let namespace = PACKAGE_REGEX.captures(text).map(|c| c[1].to_string());

        if let Some(body) = Self::first_message_body(text) {
            let name = MESSAGE_REGEX.captures(text).map(|c| c[1].to_string());
            let fields = Self::parse_fields(body)?;
            let (reserved_numbers, reserved_names) = Self::parse_reserved(body);

            return Ok(ParsedSchema {
                schema_type: SchemaType::Protobuf,
                name,
                namespace,
                fields,
                enum_symbols: Vec::new(),
                reserved_numbers,
                reserved_names,
                canonical_text: schema_registry_core::canonicalize(SchemaType::Protobuf, text)?,
            });
        }

        if let Some(cap) = ENUM_REGEX.captures(text) {
            let name = cap[1].to_string();
            let whole = cap.get(0).unwrap();
            let body = Self::block_body_from(text, whole.end() - 1)
                .map(str::to_string)
                .unwrap_or_default();
            let symbols = ENUM_VALUE_REGEX
                .captures_iter(&body)
                .map(|c| c[1].to_string())
                .collect();

            return Ok(ParsedSchema {
                schema_type: SchemaType::Protobuf,
                name: Some(name),
                namespace,
                fields: Vec::new(),
                enum_symbols: symbols,
                reserved_numbers: Vec::new(),
                reserved_names: Vec::new(),
                canonical_text: schema_registry_core::canonicalize(SchemaType::Protobuf, text)?,
            });
        }

        Err(Error::InvalidSchema(
            "protobuf schema declares no message or enum".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ProtobufParser {
        ProtobufParser::new()
    }

    #[test]
    fn parses_message_fields_and_numbers() {
        let schema = r#"
syntax = "proto3";
package example;

message User {
  int64 id = 1;
  string username = 2;
}
"#;
        let parsed = parser().parse(schema).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("User"));
        assert_eq!(parsed.namespace.as_deref(), Some("example"));
        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.field("id").unwrap().number, Some(1));
    }

    #[test]
    fn rejects_zero_field_number() {
        let schema = "syntax = \"proto3\";\nmessage Test {\n  string field = 0;\n}\n";
        assert!(parser().parse(schema).is_err());
    }

    #[test]
    fn rejects_reserved_range_number() {
        let schema = "syntax = \"proto3\";\nmessage Test {\n  string field = 19500;\n}\n";
        assert!(parser().parse(schema).is_err());
    }

    #[test]
    fn rejects_duplicate_field_numbers() {
        let schema = "syntax = \"proto3\";\nmessage Test {\n  string a = 1;\n  string b = 1;\n}\n";
        assert!(parser().parse(schema).is_err());
    }

    #[test]
    fn captures_reserved_numbers_and_names() {
        let schema = r#"
syntax = "proto3";
message Test {
  reserved 2, 15, 9 to 11;
  reserved "foo", "bar";
  string field = 1;
}
"#;
        let parsed = parser().parse(schema).unwrap();
        assert!(parsed.reserved_numbers.contains(&(9, 11)));
        assert!(parsed.reserved_names.contains(&"foo".to_string()));
    }

    #[test]
    fn parses_enum_symbols() {
        let schema = r#"
syntax = "proto3";
enum Status {
  ACTIVE = 0;
  INACTIVE = 1;
}
"#;
        let parsed = parser().parse(schema).unwrap();
        assert_eq!(parsed.enum_symbols, vec!["ACTIVE".to_string(), "INACTIVE".to_string()]);
    }
}
