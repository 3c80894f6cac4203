//! Format-specific schema parsers.

pub mod avro;
pub mod json_schema;
pub mod protobuf;
