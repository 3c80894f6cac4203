//! Reference resolution (component C3): every `references[]` entry on a
//! register/lookup/check-compatibility request must point at a live,
//! non-deleted version in the same context before the schema itself is
//! considered valid.

use schema_registry_core::{EngineBackend, Error, Result, SchemaRecord, SchemaReference, VersionSelector};

/// Resolves each reference to its pointed-at `SchemaRecord`, in the order
/// given. A reference to a missing or soft-deleted subject/version is
/// reported as `Error::InvalidSchema` naming the reference, not as a bare
/// not-found — from the caller's schema, the reference itself is malformed.
pub async fn resolve_references(
    engine: &dyn EngineBackend,
    ctx: &str,
    references: &[SchemaReference],
) -> Result<Vec<SchemaRecord>> {
    let mut resolved = Vec::with_capacity(references.len());
    for reference in references {
        let outcome = engine
            .get_version(ctx, &reference.subject, VersionSelector::Number(reference.version), false)
            .await
            .map_err(|_| {
                Error::InvalidSchema(format!(
                    "unresolved reference '{}' -> {}/versions/{}",
                    reference.name, reference.subject, reference.version
                ))
            })?;
        resolved.push(outcome.schema);
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use schema_registry_core::{
        CompatibilityMode, CompatibilityOutcome, CompatibilityTarget, Fingerprint, ImportItem,
        ImportSummary, LookupOutcome, Mode, RegisterOutcome, SchemaType, VersionOutcome,
    };

    struct FakeEngine;

    #[async_trait]
    impl EngineBackend for FakeEngine {
        async fn register(
            &self,
            _ctx: &str,
            _subject: &str,
            _schema_type: SchemaType,
            _schema_text: &str,
            _references: Vec<SchemaReference>,
            _explicit_id: Option<i64>,
        ) -> Result<RegisterOutcome> {
            unimplemented!()
        }

        async fn lookup(
            &self,
            _ctx: &str,
            _subject: &str,
            _schema_type: SchemaType,
            _schema_text: &str,
            _references: Vec<SchemaReference>,
            _include_deleted: bool,
        ) -> Result<LookupOutcome> {
            unimplemented!()
        }

        async fn get_version(
            &self,
            _ctx: &str,
            subject: &str,
            _selector: VersionSelector,
            _include_deleted: bool,
        ) -> Result<VersionOutcome> {
            if subject == "common-value" {
                Ok(VersionOutcome {
                    subject: subject.to_string(),
                    id: 1,
                    version: 1,
                    schema: SchemaRecord {
                        id: 1,
                        schema_type: SchemaType::Avro,
                        canonical_text: "{\"type\":\"string\"}".to_string(),
                        fingerprint: Fingerprint {
                            schema_type: SchemaType::Avro.into(),
                            content_hash: 42,
                            reference_hashes: vec![],
                        },
                        references: vec![],
                    },
                })
            } else {
                Err(Error::SubjectNotFound(subject.to_string()))
            }
        }

        async fn get_by_id(&self, _id: i64) -> Result<SchemaRecord> {
            unimplemented!()
        }

        async fn subjects_for_id(&self, _id: i64, _include_deleted: bool) -> Result<Vec<String>> {
            unimplemented!()
        }

        async fn versions_for_id(&self, _id: i64, _include_deleted: bool) -> Result<Vec<(String, i32)>> {
            unimplemented!()
        }

        async fn referenced_by(&self, _ctx: &str, _subject: &str, _version: i32) -> Result<Vec<i64>> {
            unimplemented!()
        }

        async fn delete_version(&self, _ctx: &str, _subject: &str, _version: i32, _permanent: bool) -> Result<i32> {
            unimplemented!()
        }

        async fn delete_subject(&self, _ctx: &str, _subject: &str, _permanent: bool) -> Result<Vec<i32>> {
            unimplemented!()
        }

        async fn list_subjects(&self, _ctx: &str, _include_deleted: bool) -> Result<Vec<String>> {
            unimplemented!()
        }

        async fn list_versions(&self, _ctx: &str, _subject: &str, _include_deleted: bool) -> Result<Vec<i32>> {
            unimplemented!()
        }

        async fn check_compatibility(
            &self,
            _ctx: &str,
            _subject: &str,
            _target: CompatibilityTarget,
            _schema_type: SchemaType,
            _schema_text: &str,
            _references: Vec<SchemaReference>,
            _verbose: bool,
        ) -> Result<CompatibilityOutcome> {
            unimplemented!()
        }

        async fn import_bulk(&self, _items: Vec<ImportItem>) -> Result<ImportSummary> {
            unimplemented!()
        }

        async fn list_contexts(&self) -> Result<Vec<String>> {
            unimplemented!()
        }

        async fn get_config(&self, _ctx: &str, _subject: Option<&str>) -> Option<CompatibilityMode> {
            unimplemented!()
        }

        async fn set_config(&self, _ctx: &str, _subject: Option<&str>, _level: CompatibilityMode) -> Result<()> {
            unimplemented!()
        }

        async fn delete_config(&self, _ctx: &str, _subject: Option<&str>) -> Result<CompatibilityMode> {
            unimplemented!()
        }

        async fn resolve_config(&self, _ctx: &str, _subject: Option<&str>) -> CompatibilityMode {
            unimplemented!()
        }

        async fn get_mode(&self, _ctx: &str, _subject: Option<&str>) -> Option<Mode> {
            unimplemented!()
        }

        async fn set_mode(&self, _ctx: &str, _subject: Option<&str>, _mode: Mode) -> Result<()> {
            unimplemented!()
        }

        async fn delete_mode(&self, _ctx: &str, _subject: Option<&str>) -> Result<Mode> {
            unimplemented!()
        }

        async fn resolve_mode(&self, _ctx: &str, _subject: Option<&str>) -> Mode {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn resolves_existing_reference() {
        let engine = FakeEngine;
        let refs = vec![SchemaReference {
            name: "common.Money".to_string(),
            subject: "common-value".to_string(),
            version: 1,
        }];
        let resolved = resolve_references(&engine, ".", &refs).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, 1);
    }

    #[tokio::test]
    async fn missing_reference_is_invalid_schema() {
        let engine = FakeEngine;
        let refs = vec![SchemaReference {
            name: "common.Money".to_string(),
            subject: "missing-value".to_string(),
            version: 1,
        }];
        let err = resolve_references(&engine, ".", &refs).await.unwrap_err();
        assert!(err.is_validation_error());
    }
}
