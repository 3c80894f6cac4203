//! Compatibility checking (component C4): per-format rule sets plus the
//! mode/direction/transitivity orchestration that turns a list of rule
//! violations into the `CompatibilityOutcome` the Engine returns.

pub mod avro;
pub mod cache;
pub mod json_schema;
pub mod protobuf;

pub use cache::{CacheKey, CompatibilityCache};

use std::sync::Arc;

use schema_registry_core::{
    CompatibilityMode, CompatibilityOutcome, FormatCompatibilityChecker, ParsedSchema, SchemaType,
};

/// Builds the rule set for a given schema type.
pub fn checker_for(schema_type: SchemaType) -> Arc<dyn FormatCompatibilityChecker> {
    match schema_type {
        SchemaType::Avro => Arc::new(avro::AvroCompatibilityChecker::new()),
        SchemaType::Protobuf => Arc::new(protobuf::ProtobufCompatibilityChecker::new()),
        SchemaType::Json => Arc::new(json_schema::JsonSchemaCompatibilityChecker::new()),
    }
}

/// Evaluates `new` against one or more prior versions under `mode`.
///
/// `candidates` is the set of prior versions to check against: exactly one
/// for a non-transitive mode (the latest visible version), or every
/// non-deleted version for a `*_TRANSITIVE` mode, oldest-first so the first
/// reported violation names the earliest version that breaks.
pub fn evaluate(
    mode: CompatibilityMode,
    schema_type: SchemaType,
    new: &ParsedSchema,
    candidates: &[ParsedSchema],
    verbose: bool,
) -> CompatibilityOutcome {
    if mode == CompatibilityMode::None {
        return CompatibilityOutcome { is_compatible: true, messages: Vec::new() };
    }

    let checker = checker_for(schema_type);
    let directions = mode.directions();
    let mut messages = Vec::new();

    for candidate in candidates {
        for &direction in directions {
            let violations = checker.check(candidate, new, direction);
            if !violations.is_empty() {
                if verbose {
                    messages.extend(
                        violations
                            .iter()
                            .map(|v| format!("[{:?}] {}: {}", v.direction, v.path, v.message)),
                    );
                } else {
                    messages.push(violations[0].message.clone());
                }
                // Non-transitive modes only ever receive one candidate, so
                // returning at the first failing version is correct for
                // both transitive and non-transitive callers.
                return CompatibilityOutcome { is_compatible: false, messages };
            }
        }
    }

    CompatibilityOutcome { is_compatible: true, messages }
}
