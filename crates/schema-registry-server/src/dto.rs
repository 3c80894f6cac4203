//! Wire request/response shapes (§6). Reuses core domain types directly
//! wherever their `serde` shape already matches the wire format, so the
//! HTTP layer never re-derives a parallel representation of the same data.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use schema_registry_core::{
    CompatibilityMode, ImportItem, Mode, SchemaReference, SchemaType, DEFAULT_CONTEXT,
};

fn default_schema_type() -> SchemaType {
    SchemaType::Avro
}

/// `schemaType` matching is case-insensitive per §6, so this deserializes
/// through `SchemaType::from_str` rather than the exact-case derive.
fn deserialize_schema_type<'de, D>(deserializer: D) -> Result<SchemaType, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    SchemaType::from_str(&raw).map_err(serde::de::Error::custom)
}

/// Returns `None` for AVRO so the response omits `schemaType`, per §6's
/// "omit `schemaType` field when AVRO" rule.
pub fn schema_type_for_wire(schema_type: SchemaType) -> Option<SchemaType> {
    (schema_type != SchemaType::Avro).then_some(schema_type)
}

/// Body shared by register, lookup, and compatibility-check requests.
#[derive(Debug, Deserialize)]
pub struct SchemaRequest {
    pub schema: String,
    #[serde(
        rename = "schemaType",
        default = "default_schema_type",
        deserialize_with = "deserialize_schema_type"
    )]
    pub schema_type: SchemaType,
    #[serde(default)]
    pub references: Vec<SchemaReference>,
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct SchemaByIdResponse {
    pub schema: String,
    #[serde(rename = "schemaType", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub subject: String,
    pub id: i64,
    pub version: i32,
    pub schema: String,
    #[serde(rename = "schemaType", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SchemaReference>,
}

#[derive(Debug, Serialize)]
pub struct IdSubjectVersion {
    pub subject: String,
    pub version: i32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigBody {
    pub compatibility: CompatibilityMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: Mode,
}

#[derive(Debug, Deserialize)]
pub struct ImportItemDto {
    pub id: i64,
    #[serde(default = "default_context")]
    pub context: String,
    pub subject: String,
    #[serde(
        rename = "schemaType",
        default = "default_schema_type",
        deserialize_with = "deserialize_schema_type"
    )]
    pub schema_type: SchemaType,
    pub schema: String,
    #[serde(default)]
    pub references: Vec<SchemaReference>,
}

fn default_context() -> String {
    DEFAULT_CONTEXT.to_string()
}

impl From<ImportItemDto> for ImportItem {
    fn from(dto: ImportItemDto) -> Self {
        ImportItem {
            id: dto.id,
            context: dto.context,
            subject: dto.subject,
            schema_type: dto.schema_type,
            schema_text: dto.schema,
            references: dto.references,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub items: Vec<ImportItemDto>,
}
