//! Schema canonicalization and fingerprinting (component C1).
//!
//! A fingerprint is the unique key in the global schema table: two
//! registrations of the same logical schema, differing only in
//! insignificant whitespace or comments, must canonicalize to the same
//! fingerprint regardless of which subject they are registered under.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::schema::SchemaReference;
use crate::types::SchemaType;

/// `(schema_type, content-hash of canonical_text, normalized references)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    pub schema_type: SchemaTypeTag,
    pub content_hash: u64,
    pub reference_hashes: Vec<(String, u64)>,
}

/// `SchemaType` isn't `Hash`/`Eq` itself (it derives neither beyond what
/// serde needs), so the fingerprint stores a small owned tag instead of the
/// wire type directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaTypeTag {
    Avro,
    Protobuf,
    Json,
}

impl From<SchemaType> for SchemaTypeTag {
    fn from(t: SchemaType) -> Self {
        match t {
            SchemaType::Avro => SchemaTypeTag::Avro,
            SchemaType::Protobuf => SchemaTypeTag::Protobuf,
            SchemaType::Json => SchemaTypeTag::Json,
        }
    }
}

/// Canonicalize schema text per-type, returning the bytes that get hashed.
pub fn canonicalize(schema_type: SchemaType, text: &str) -> Result<String> {
    match schema_type {
        SchemaType::Avro | SchemaType::Json => canonicalize_json(text),
        SchemaType::Protobuf => Ok(canonicalize_protobuf(text)),
    }
}

/// Avro Parsing Canonical Form (restricted to the fields the spec keeps) and
/// plain JSON Schema canonicalization both reduce to: parse, keep only
/// semantically significant keys (Avro only), recursively sort object keys,
/// and re-serialize without insignificant whitespace.
fn canonicalize_json(text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::InvalidSchema(format!("invalid JSON: {e}")))?;
    let canonical = sort_keys(&value);
    serde_json::to_string(&canonical).map_err(Error::Serialization)
}

const AVRO_SIGNIFICANT_KEYS: &[&str] = &[
    "type", "name", "namespace", "fields", "items", "values", "size", "symbols", "default",
];

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in entries {
                // Avro canonical form drops documentation/annotation keys;
                // JSON Schema keeps everything, so we only filter keys that
                // look like Avro metadata (doc, aliases) when present
                // alongside Avro-significant siblings.
                if k == "doc" || k == "aliases" {
                    let has_avro_sibling = map.keys().any(|k2| AVRO_SIGNIFICANT_KEYS.contains(&k2.as_str()));
                    if has_avro_sibling {
                        continue;
                    }
                }
                out.insert(k.clone(), sort_keys(v));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Strip comments and collapse whitespace; the field numbers/types/ordering
/// otherwise stay exactly as written, per SPEC_FULL.md §4.1.
fn canonicalize_protobuf(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for raw_line in text.lines() {
        let line = strip_line_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn strip_line_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn content_hash(bytes: &[u8]) -> u64 {
    let digest = Sha256::digest(bytes);
    u64::from_be_bytes(digest[0..8].try_into().expect("sha256 digest is >= 8 bytes"))
}

/// Compute the fingerprint of a schema, given its already-resolved
/// references (each normalized to its own fingerprint's content hash).
pub fn fingerprint(
    schema_type: SchemaType,
    canonical_text: &str,
    references: &[SchemaReference],
    reference_hashes: &[u64],
) -> Fingerprint {
    let content_hash = content_hash(canonical_text.as_bytes());
    let reference_hashes = references
        .iter()
        .zip(reference_hashes.iter())
        .map(|(r, h)| (r.name.clone(), *h))
        .collect();

    Fingerprint {
        schema_type: schema_type.into(),
        content_hash,
        reference_hashes,
    }
}
