//! `MemoryEngine`: the in-process `EngineBackend` implementation (component
//! C7, ambient C10). All registry state — schemas, subjects, config, mode —
//! lives behind a single `parking_lot::Mutex`, matching SPEC_FULL.md §5's
//! "simplest conforming implementation" note: since no operation here ever
//! awaits while holding it, one coarse lock is externally indistinguishable
//! from a per-subject write lock plus a global ID-allocation lock, and is
//! far simpler to get right.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::instrument;

use schema_registry_compatibility::evaluate;
use schema_registry_core::{
    fingerprint as compute_fingerprint, CompatibilityMode, CompatibilityOutcome, CompatibilityTarget,
    EngineBackend, Error, Fingerprint, ImportItem, ImportItemResult, ImportSummary, LookupOutcome, Mode,
    ParsedSchema, RegisterOutcome, Result, SchemaReference, SchemaRecord, SchemaType, Subject, SubjectRef,
    VersionOutcome, VersionSelector,
};
use schema_registry_validation::{parser_for, resolve_references};

type SubjectKey = (String, String);
type ConfigKey = (String, Option<String>);

struct Inner {
    schemas: HashMap<i64, SchemaRecord>,
    fingerprint_index: HashMap<Fingerprint, i64>,
    subjects: HashMap<SubjectKey, Subject>,
    config: HashMap<ConfigKey, CompatibilityMode>,
    mode: HashMap<ConfigKey, Mode>,
    next_id: i64,
}

pub struct MemoryEngine {
    inner: Mutex<Inner>,
    default_compatibility: CompatibilityMode,
    default_mode: Mode,
}

impl MemoryEngine {
    pub fn new(default_compatibility: CompatibilityMode, default_mode: Mode) -> Self {
        Self {
            inner: Mutex::new(Inner {
                schemas: HashMap::new(),
                fingerprint_index: HashMap::new(),
                subjects: HashMap::new(),
                config: HashMap::new(),
                mode: HashMap::new(),
                next_id: 1,
            }),
            default_compatibility,
            default_mode,
        }
    }

    fn resolve_config_locked(&self, inner: &Inner, ctx: &str, subject: Option<&str>) -> CompatibilityMode {
        if let Some(subject) = subject {
            if let Some(level) = inner.config.get(&(ctx.to_string(), Some(subject.to_string()))) {
                return *level;
            }
        }
        if let Some(level) = inner.config.get(&(ctx.to_string(), None)) {
            return *level;
        }
        self.default_compatibility
    }

    fn resolve_mode_locked(&self, inner: &Inner, ctx: &str, subject: Option<&str>) -> Mode {
        if let Some(subject) = subject {
            if let Some(mode) = inner.mode.get(&(ctx.to_string(), Some(subject.to_string()))) {
                return *mode;
            }
        }
        if let Some(mode) = inner.mode.get(&(ctx.to_string(), None)) {
            return *mode;
        }
        self.default_mode
    }

    fn parse_record(record: &SchemaRecord) -> Result<ParsedSchema> {
        parser_for(record.schema_type).parse(&record.canonical_text)
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new(CompatibilityMode::default(), Mode::default())
    }
}

#[async_trait]
impl EngineBackend for MemoryEngine {
    #[instrument(skip(self, schema_text, references))]
    async fn register(
        &self,
        ctx: &str,
        subject: &str,
        schema_type: SchemaType,
        schema_text: &str,
        references: Vec<SchemaReference>,
        explicit_id: Option<i64>,
    ) -> Result<RegisterOutcome> {
        let resolved_mode = self.resolve_mode(ctx, Some(subject)).await;
        if !resolved_mode.allows_write() {
            return Err(Error::OperationNotPermitted(format!(
                "subject '{subject}' is in mode {resolved_mode:?}, which does not permit writes"
            )));
        }
        if explicit_id.is_some() && !resolved_mode.is_import() {
            return Err(Error::OperationNotPermitted(
                "an explicit schema id may only be supplied in IMPORT mode".to_string(),
            ));
        }

        let parsed = parser_for(schema_type).parse(schema_text)?;
        let resolved_refs = resolve_references(self, ctx, &references).await?;
        let reference_hashes: Vec<u64> = resolved_refs.iter().map(|r| r.fingerprint.content_hash).collect();
        let fingerprint = compute_fingerprint(schema_type, &parsed.canonical_text, &references, &reference_hashes);

        let mut inner = self.inner.lock();

        let id = match explicit_id {
            Some(explicit_id) => {
                match inner.schemas.get(&explicit_id) {
                    Some(existing) if existing.fingerprint != fingerprint => {
                        return Err(Error::OperationNotPermitted(format!(
                            "id {explicit_id} is already assigned to a different schema"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        if let Some(&other_id) = inner.fingerprint_index.get(&fingerprint) {
                            if other_id != explicit_id {
                                return Err(Error::OperationNotPermitted(format!(
                                    "schema content is already registered under id {other_id}, cannot import as id {explicit_id}"
                                )));
                            }
                        }
                        inner.schemas.insert(
                            explicit_id,
                            SchemaRecord {
                                id: explicit_id,
                                schema_type,
                                canonical_text: parsed.canonical_text.clone(),
                                fingerprint: fingerprint.clone(),
                                references: references.clone(),
                            },
                        );
                        inner.fingerprint_index.insert(fingerprint.clone(), explicit_id);
                        inner.next_id = inner.next_id.max(explicit_id + 1);
                    }
                }
                explicit_id
            }
            None => match inner.fingerprint_index.get(&fingerprint) {
                Some(&existing_id) => existing_id,
                None => {
                    let id = inner.next_id;
                    inner.next_id += 1;
                    inner.schemas.insert(
                        id,
                        SchemaRecord {
                            id,
                            schema_type,
                            canonical_text: parsed.canonical_text.clone(),
                            fingerprint: fingerprint.clone(),
                            references: references.clone(),
                        },
                    );
                    inner.fingerprint_index.insert(fingerprint.clone(), id);
                    id
                }
            },
        };

        let key = (ctx.to_string(), subject.to_string());

        // Read-only phase: idempotency check and candidate gathering. Kept
        // separate from the mutable phase below so borrows of `inner.subjects`
        // never overlap with the whole-`Inner` borrow `resolve_config_locked`
        // needs.
        if let Some(existing_subject) = inner.subjects.get(&key) {
            if let Some(existing) = existing_subject.versions.iter().find(|v| v.schema_id == id && !v.deleted) {
                return Ok(RegisterOutcome {
                    id,
                    version: existing.version_number,
                    subject: subject.to_string(),
                });
            }
        }

        let level = self.resolve_config_locked(&inner, ctx, Some(subject));
        let candidate_ids: Vec<i64> = match inner.subjects.get(&key) {
            Some(existing_subject) if level.is_transitive() => {
                existing_subject.visible_versions(false).map(|v| v.schema_id).collect()
            }
            Some(existing_subject) => {
                existing_subject.latest_visible(false).map(|v| v.schema_id).into_iter().collect()
            }
            None => Vec::new(),
        };

        let mut parsed_candidates = Vec::with_capacity(candidate_ids.len());
        for schema_id in candidate_ids {
            let record = inner
                .schemas
                .get(&schema_id)
                .ok_or_else(|| Error::Internal(format!("dangling schema id {schema_id}")))?;
            parsed_candidates.push(Self::parse_record(record)?);
        }

        if !parsed_candidates.is_empty() {
            let outcome = evaluate(level, schema_type, &parsed, &parsed_candidates, false);
            if !outcome.is_compatible {
                let message = outcome
                    .messages
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| "schema violates the subject's compatibility rules".to_string());
                return Err(Error::IncompatibleSchema(message));
            }
        }

        let subject_entry = inner
            .subjects
            .entry(key)
            .or_insert_with(|| Subject::new(ctx, subject));
        let version_number = subject_entry.append_version(id);

        Ok(RegisterOutcome {
            id,
            version: version_number,
            subject: subject.to_string(),
        })
    }

    #[instrument(skip(self, schema_text, references))]
    async fn lookup(
        &self,
        ctx: &str,
        subject: &str,
        schema_type: SchemaType,
        schema_text: &str,
        references: Vec<SchemaReference>,
        include_deleted: bool,
    ) -> Result<LookupOutcome> {
        let parsed = parser_for(schema_type).parse(schema_text)?;
        let resolved_refs = resolve_references(self, ctx, &references).await?;
        let reference_hashes: Vec<u64> = resolved_refs.iter().map(|r| r.fingerprint.content_hash).collect();
        let fingerprint = compute_fingerprint(schema_type, &parsed.canonical_text, &references, &reference_hashes);

        let inner = self.inner.lock();
        let key = (ctx.to_string(), subject.to_string());
        let subject_entry = inner
            .subjects
            .get(&key)
            .ok_or_else(|| Error::SubjectNotFound(subject.to_string()))?;

        for entry in subject_entry.visible_versions(include_deleted) {
            if let Some(record) = inner.schemas.get(&entry.schema_id) {
                if record.fingerprint == fingerprint {
                    return Ok(LookupOutcome {
                        subject: subject.to_string(),
                        id: record.id,
                        version: entry.version_number,
                        schema: record.clone(),
                    });
                }
            }
        }

        Err(Error::SchemaNotFound(format!(
            "no version of '{subject}' matches the given schema"
        )))
    }

    #[instrument(skip(self))]
    async fn get_version(
        &self,
        ctx: &str,
        subject: &str,
        selector: VersionSelector,
        include_deleted: bool,
    ) -> Result<VersionOutcome> {
        let inner = self.inner.lock();
        let key = (ctx.to_string(), subject.to_string());
        let subject_entry = inner
            .subjects
            .get(&key)
            .ok_or_else(|| Error::SubjectNotFound(subject.to_string()))?;

        let entry = match selector {
            VersionSelector::Latest => subject_entry
                .latest_visible(include_deleted)
                .ok_or_else(|| Error::VersionNotFound("no versions exist for this subject".to_string()))?,
            VersionSelector::Number(number) => {
                if number <= 0 {
                    return Err(Error::InvalidVersion(number.to_string()));
                }
                subject_entry
                    .get_version(number)
                    .filter(|v| include_deleted || !v.deleted)
                    .ok_or_else(|| Error::VersionNotFound(number.to_string()))?
            }
        };

        let record = inner
            .schemas
            .get(&entry.schema_id)
            .ok_or_else(|| Error::Internal(format!("dangling schema id {}", entry.schema_id)))?;

        Ok(VersionOutcome {
            subject: subject.to_string(),
            id: record.id,
            version: entry.version_number,
            schema: record.clone(),
        })
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<SchemaRecord> {
        self.inner
            .lock()
            .schemas
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::SchemaNotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    async fn subjects_for_id(&self, id: i64, include_deleted: bool) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        if !inner.schemas.contains_key(&id) {
            return Err(Error::SchemaNotFound(id.to_string()));
        }
        let mut subjects: Vec<String> = inner
            .subjects
            .iter()
            .filter(|(_, s)| s.versions.iter().any(|v| v.schema_id == id && (include_deleted || !v.deleted)))
            .map(|((ctx, name), _)| SubjectRef::new(ctx.clone(), name.clone()).to_string())
            .collect();
        subjects.sort();
        Ok(subjects)
    }

    #[instrument(skip(self))]
    async fn versions_for_id(&self, id: i64, include_deleted: bool) -> Result<Vec<(String, i32)>> {
        let inner = self.inner.lock();
        if !inner.schemas.contains_key(&id) {
            return Err(Error::SchemaNotFound(id.to_string()));
        }
        let mut result: Vec<(String, i32)> = Vec::new();
        for ((ctx, name), subject) in inner.subjects.iter() {
            for version in subject.versions.iter().filter(|v| v.schema_id == id && (include_deleted || !v.deleted)) {
                result.push((SubjectRef::new(ctx.clone(), name.clone()).to_string(), version.version_number));
            }
        }
        result.sort();
        Ok(result)
    }

    #[instrument(skip(self))]
    async fn referenced_by(&self, ctx: &str, subject: &str, version: i32) -> Result<Vec<i64>> {
        let inner = self.inner.lock();
        let key = (ctx.to_string(), subject.to_string());
        let subject_entry = inner
            .subjects
            .get(&key)
            .ok_or_else(|| Error::SubjectNotFound(subject.to_string()))?;
        let target = subject_entry
            .get_version(version)
            .ok_or_else(|| Error::VersionNotFound(version.to_string()))?;

        let mut ids: Vec<i64> = inner
            .schemas
            .values()
            .filter(|record| {
                record
                    .references
                    .iter()
                    .any(|r| r.subject == subject && r.version == target.version_number)
            })
            .map(|record| record.id)
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn delete_version(&self, ctx: &str, subject: &str, version: i32, permanent: bool) -> Result<i32> {
        let mut inner = self.inner.lock();
        let key = (ctx.to_string(), subject.to_string());
        let subject_entry = inner
            .subjects
            .get_mut(&key)
            .ok_or_else(|| Error::SubjectNotFound(subject.to_string()))?;

        let position = subject_entry
            .versions
            .iter()
            .position(|v| v.version_number == version)
            .ok_or_else(|| Error::VersionNotFound(version.to_string()))?;

        if permanent {
            if !subject_entry.versions[position].deleted {
                return Err(Error::VersionNotSoftDeleted(version));
            }
            subject_entry.versions.remove(position);
            if subject_entry.versions.is_empty() {
                inner.subjects.remove(&key);
            }
        } else {
            subject_entry.versions[position].deleted = true;
        }

        Ok(version)
    }

    #[instrument(skip(self))]
    async fn delete_subject(&self, ctx: &str, subject: &str, permanent: bool) -> Result<Vec<i32>> {
        let mut inner = self.inner.lock();
        let key = (ctx.to_string(), subject.to_string());
        let subject_entry = inner
            .subjects
            .get_mut(&key)
            .ok_or_else(|| Error::SubjectNotFound(subject.to_string()))?;

        if permanent {
            if !subject_entry.deleted {
                return Err(Error::SubjectNotSoftDeleted(subject.to_string()));
            }
            let versions: Vec<i32> = subject_entry.versions.iter().map(|v| v.version_number).collect();
            inner.subjects.remove(&key);
            Ok(versions)
        } else {
            subject_entry.deleted = true;
            for v in subject_entry.versions.iter_mut() {
                v.deleted = true;
            }
            Ok(subject_entry.versions.iter().map(|v| v.version_number).collect())
        }
    }

    #[instrument(skip(self))]
    async fn list_subjects(&self, ctx: &str, include_deleted: bool) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        let mut names: Vec<String> = inner
            .subjects
            .iter()
            .filter(|((c, _), s)| c == ctx && (include_deleted || !s.deleted))
            .map(|((_, name), _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    #[instrument(skip(self))]
    async fn list_versions(&self, ctx: &str, subject: &str, include_deleted: bool) -> Result<Vec<i32>> {
        let inner = self.inner.lock();
        let key = (ctx.to_string(), subject.to_string());
        let subject_entry = inner
            .subjects
            .get(&key)
            .ok_or_else(|| Error::SubjectNotFound(subject.to_string()))?;
        let mut versions: Vec<i32> = subject_entry.visible_versions(include_deleted).map(|v| v.version_number).collect();
        versions.sort();
        Ok(versions)
    }

    #[instrument(skip(self, schema_text, references))]
    async fn check_compatibility(
        &self,
        ctx: &str,
        subject: &str,
        target: CompatibilityTarget,
        schema_type: SchemaType,
        schema_text: &str,
        references: Vec<SchemaReference>,
        verbose: bool,
    ) -> Result<CompatibilityOutcome> {
        let _ = references;
        let parsed = parser_for(schema_type).parse(schema_text)?;

        let inner = self.inner.lock();
        let key = (ctx.to_string(), subject.to_string());
        let subject_entry = match inner.subjects.get(&key) {
            Some(s) => s,
            None => {
                return match target {
                    CompatibilityTarget::AllVersions => Ok(CompatibilityOutcome { is_compatible: true, messages: vec![] }),
                    CompatibilityTarget::Specific(_) => Err(Error::SubjectNotFound(subject.to_string())),
                };
            }
        };

        let level = self.resolve_config_locked(&inner, ctx, Some(subject));

        let candidate_ids: Vec<i64> = match target {
            CompatibilityTarget::Specific(version) => {
                let entry = subject_entry
                    .get_version(version)
                    .ok_or_else(|| Error::VersionNotFound(version.to_string()))?;
                vec![entry.schema_id]
            }
            CompatibilityTarget::AllVersions => {
                if level.is_transitive() {
                    subject_entry.visible_versions(false).map(|v| v.schema_id).collect()
                } else {
                    subject_entry.latest_visible(false).map(|v| v.schema_id).into_iter().collect()
                }
            }
        };

        let mut candidates = Vec::with_capacity(candidate_ids.len());
        for id in candidate_ids {
            let record = inner
                .schemas
                .get(&id)
                .ok_or_else(|| Error::Internal(format!("dangling schema id {id}")))?;
            candidates.push(Self::parse_record(record)?);
        }

        Ok(evaluate(level, schema_type, &parsed, &candidates, verbose))
    }

    #[instrument(skip(self, items))]
    async fn import_bulk(&self, items: Vec<ImportItem>) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        for item in items {
            let result = self
                .register(
                    &item.context,
                    &item.subject,
                    item.schema_type,
                    &item.schema_text,
                    item.references.clone(),
                    Some(item.id),
                )
                .await;
            match result {
                Ok(outcome) => {
                    summary.imported += 1;
                    summary.details.push(ImportItemResult {
                        subject: item.subject,
                        outcome: Ok(outcome),
                    });
                }
                Err(err) => {
                    summary.errors += 1;
                    summary.details.push(ImportItemResult {
                        subject: item.subject,
                        outcome: Err(err.to_string()),
                    });
                }
            }
        }
        Ok(summary)
    }

    #[instrument(skip(self))]
    async fn list_contexts(&self) -> Result<Vec<String>> {
        let inner = self.inner.lock();
        let mut contexts: std::collections::HashSet<String> =
            std::collections::HashSet::from([schema_registry_core::DEFAULT_CONTEXT.to_string()]);
        contexts.extend(inner.subjects.keys().map(|(ctx, _)| ctx.clone()));
        contexts.extend(inner.config.keys().map(|(ctx, _)| ctx.clone()));
        contexts.extend(inner.mode.keys().map(|(ctx, _)| ctx.clone()));
        let mut contexts: Vec<String> = contexts.into_iter().collect();
        contexts.sort();
        Ok(contexts)
    }

    async fn get_config(&self, ctx: &str, subject: Option<&str>) -> Option<CompatibilityMode> {
        self.inner.lock().config.get(&(ctx.to_string(), subject.map(str::to_string))).copied()
    }

    async fn set_config(&self, ctx: &str, subject: Option<&str>, level: CompatibilityMode) -> Result<()> {
        self.inner.lock().config.insert((ctx.to_string(), subject.map(str::to_string)), level);
        Ok(())
    }

    async fn delete_config(&self, ctx: &str, subject: Option<&str>) -> Result<CompatibilityMode> {
        let mut inner = self.inner.lock();
        inner.config.remove(&(ctx.to_string(), subject.map(str::to_string)));
        Ok(self.resolve_config_locked(&inner, ctx, subject))
    }

    async fn resolve_config(&self, ctx: &str, subject: Option<&str>) -> CompatibilityMode {
        let inner = self.inner.lock();
        self.resolve_config_locked(&inner, ctx, subject)
    }

    async fn get_mode(&self, ctx: &str, subject: Option<&str>) -> Option<Mode> {
        self.inner.lock().mode.get(&(ctx.to_string(), subject.map(str::to_string))).copied()
    }

    async fn set_mode(&self, ctx: &str, subject: Option<&str>, mode: Mode) -> Result<()> {
        self.inner.lock().mode.insert((ctx.to_string(), subject.map(str::to_string)), mode);
        Ok(())
    }

    async fn delete_mode(&self, ctx: &str, subject: Option<&str>) -> Result<Mode> {
        let mut inner = self.inner.lock();
        inner.mode.remove(&(ctx.to_string(), subject.map(str::to_string)));
        Ok(self.resolve_mode_locked(&inner, ctx, subject))
    }

    async fn resolve_mode(&self, ctx: &str, subject: Option<&str>) -> Mode {
        let inner = self.inner.lock();
        self.resolve_mode_locked(&inner, ctx, subject)
    }
}
