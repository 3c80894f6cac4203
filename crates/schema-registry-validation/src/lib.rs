//! Schema parsers (component C2) and reference resolution (component C3).

pub mod references;
pub mod validators;

pub use references::resolve_references;
pub use validators::{avro::AvroParser, json_schema::JsonSchemaParser, protobuf::ProtobufParser};

use schema_registry_core::{SchemaParser, SchemaType};
use std::sync::Arc;

/// Builds the parser for a given schema type. The server wires this once at
/// startup and hands `Arc<dyn SchemaParser>` handles to the Engine.
pub fn parser_for(schema_type: SchemaType) -> Arc<dyn SchemaParser> {
    match schema_type {
        SchemaType::Avro => Arc::new(AvroParser::new()),
        SchemaType::Protobuf => Arc::new(ProtobufParser::new()),
        SchemaType::Json => Arc::new(JsonSchemaParser::new()),
    }
}
