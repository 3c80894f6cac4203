//! Core domain types for the schema registry: the data model, the error
//! taxonomy, schema fingerprinting, context/subject parsing, and the
//! storage-facing trait the Engine is built against.

pub mod context;
pub mod error;
pub mod fingerprint;
pub mod schema;
pub mod traits;
pub mod types;

pub use context::{SubjectRef, DEFAULT_CONTEXT};
pub use error::{Error, Result};
pub use fingerprint::{canonicalize, fingerprint, Fingerprint, SchemaTypeTag};
pub use schema::{SchemaRecord, SchemaReference, Subject, VersionEntry};
pub use traits::{
    CompatibilityOutcome, CompatibilityTarget, EngineBackend, FormatCompatibilityChecker,
    ImportItem, ImportItemResult, ImportSummary, LookupOutcome, ParsedField, ParsedSchema,
    RegisterOutcome, SchemaParser, VersionOutcome, VersionSelector, Violation,
};
pub use types::{CompatibilityMode, Direction, Mode, SchemaType};
