//! Seams the Engine is built against: a parsed-schema representation and
//! trait shared by the format parsers (C2) and compatibility checkers (C4),
//! and the coarse-grained storage/engine trait (C7, ambient C10) that keeps
//! the registry core decoupled from any one persistence mechanism.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::{SchemaReference, SchemaRecord};
use crate::types::{CompatibilityMode, Direction, Mode, SchemaType};

/// One field/property extracted from a parsed schema, format-agnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedField {
    pub name: String,
    pub type_name: String,
    /// Protobuf field number; `None` for Avro/JSON fields.
    pub number: Option<u32>,
    pub has_default: bool,
    pub default_value: Option<serde_json::Value>,
    /// JSON Schema `required`, or Protobuf `required` label.
    pub required: bool,
}

/// The abstract representation every C2 parser produces (component C2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSchema {
    pub schema_type: SchemaType,
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub fields: Vec<ParsedField>,
    pub enum_symbols: Vec<String>,
    pub reserved_numbers: Vec<(u32, u32)>,
    pub reserved_names: Vec<String>,
    pub canonical_text: String,
}

impl ParsedSchema {
    pub fn fully_qualified_name(&self) -> Option<String> {
        match (&self.namespace, &self.name) {
            (Some(ns), Some(name)) if !ns.is_empty() => Some(format!("{ns}.{name}")),
            (_, Some(name)) => Some(name.clone()),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&ParsedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Parses raw schema text into a `ParsedSchema` (component C2). Implemented
/// once per `SchemaType` in `schema-registry-validation`.
#[async_trait]
pub trait SchemaParser: Send + Sync {
    fn schema_type(&self) -> SchemaType;

    /// Parse and structurally validate `text`. Parse failure is always
    /// surfaced as `Error::InvalidSchema`.
    fn parse(&self, text: &str) -> Result<ParsedSchema>;
}

/// A single compatibility rule violation (component C4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub direction: Direction,
    pub path: String,
    pub message: String,
}

/// Per-format compatibility rule set (component C4), variant-dispatched by
/// `schema_type` per SPEC_FULL.md §9.
pub trait FormatCompatibilityChecker: Send + Sync {
    fn schema_type(&self) -> SchemaType;

    /// `old` must be readable by a reader built from `new` (BACKWARD) or
    /// vice versa (FORWARD), depending on `direction`.
    fn check(&self, old: &ParsedSchema, new: &ParsedSchema, direction: Direction) -> Vec<Violation>;
}

/// Outcome of a register call (component C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterOutcome {
    pub id: i64,
    pub version: i32,
    pub subject: String,
}

/// Outcome of an exact-match lookup (component C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupOutcome {
    pub subject: String,
    pub id: i64,
    pub version: i32,
    pub schema: SchemaRecord,
}

/// A version selector as accepted by `GET /subjects/{subj}/versions/{v}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Number(i32),
    Latest,
}

/// Outcome of `GetVersion` (component C7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionOutcome {
    pub subject: String,
    pub id: i64,
    pub version: i32,
    pub schema: SchemaRecord,
}

/// Which prior versions a compatibility check runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityTarget {
    Specific(i32),
    AllVersions,
}

/// Outcome of `CheckCompatibility` (component C4/C7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatibilityOutcome {
    pub is_compatible: bool,
    pub messages: Vec<String>,
}

/// One item of a bulk import request.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportItem {
    pub id: i64,
    pub context: String,
    pub subject: String,
    pub schema_type: SchemaType,
    pub schema_text: String,
    pub references: Vec<SchemaReference>,
}

/// Outcome of one item within a bulk import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportItemResult {
    pub subject: String,
    pub outcome: std::result::Result<RegisterOutcome, String>,
}

/// Aggregate result of `ImportBulk` (component C7).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub errors: usize,
    pub details: Vec<ImportItemResult>,
}

/// The coarse-grained, object-safe seam between the HTTP layer and the
/// Engine's state (components C5-C8, ambient C10). Every method here is
/// atomic with respect to the others per SPEC_FULL.md §5; the sole
/// implementation in this workspace is `schema-registry-storage`'s
/// `MemoryEngine`, but handlers depend only on this trait so a durable
/// backend could be dropped in without touching C9.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    async fn register(
        &self,
        ctx: &str,
        subject: &str,
        schema_type: SchemaType,
        schema_text: &str,
        references: Vec<SchemaReference>,
        explicit_id: Option<i64>,
    ) -> Result<RegisterOutcome>;

    async fn lookup(
        &self,
        ctx: &str,
        subject: &str,
        schema_type: SchemaType,
        schema_text: &str,
        references: Vec<SchemaReference>,
        include_deleted: bool,
    ) -> Result<LookupOutcome>;

    async fn get_version(
        &self,
        ctx: &str,
        subject: &str,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> Result<VersionOutcome>;

    async fn get_by_id(&self, id: i64) -> Result<SchemaRecord>;

    async fn subjects_for_id(&self, id: i64, include_deleted: bool) -> Result<Vec<String>>;

    async fn versions_for_id(&self, id: i64, include_deleted: bool) -> Result<Vec<(String, i32)>>;

    async fn referenced_by(&self, ctx: &str, subject: &str, version: i32) -> Result<Vec<i64>>;

    async fn delete_version(
        &self,
        ctx: &str,
        subject: &str,
        version: i32,
        permanent: bool,
    ) -> Result<i32>;

    async fn delete_subject(&self, ctx: &str, subject: &str, permanent: bool) -> Result<Vec<i32>>;

    async fn list_subjects(&self, ctx: &str, include_deleted: bool) -> Result<Vec<String>>;

    async fn list_versions(&self, ctx: &str, subject: &str, include_deleted: bool) -> Result<Vec<i32>>;

    async fn check_compatibility(
        &self,
        ctx: &str,
        subject: &str,
        target: CompatibilityTarget,
        schema_type: SchemaType,
        schema_text: &str,
        references: Vec<SchemaReference>,
        verbose: bool,
    ) -> Result<CompatibilityOutcome>;

    async fn import_bulk(&self, items: Vec<ImportItem>) -> Result<ImportSummary>;

    async fn list_contexts(&self) -> Result<Vec<String>>;

    async fn get_config(&self, ctx: &str, subject: Option<&str>) -> Option<CompatibilityMode>;
    async fn set_config(&self, ctx: &str, subject: Option<&str>, level: CompatibilityMode) -> Result<()>;
    async fn delete_config(&self, ctx: &str, subject: Option<&str>) -> Result<CompatibilityMode>;
    async fn resolve_config(&self, ctx: &str, subject: Option<&str>) -> CompatibilityMode;

    async fn get_mode(&self, ctx: &str, subject: Option<&str>) -> Option<Mode>;
    async fn set_mode(&self, ctx: &str, subject: Option<&str>, mode: Mode) -> Result<()>;
    async fn delete_mode(&self, ctx: &str, subject: Option<&str>) -> Result<Mode>;
    async fn resolve_mode(&self, ctx: &str, subject: Option<&str>) -> Mode;
}
