//! HTTP handlers for the registry's URL surface (§6). Every handler parses
//! its subject path segment through `SubjectRef` so context-prefixed and
//! bare subjects are handled identically, then delegates to `AppState`'s
//! `EngineBackend` and lets the Engine's typed errors flow back through
//! `AppError`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use schema_registry_core::{
    context::SubjectRef, error::Error as CoreError, CompatibilityTarget, SchemaType,
    VersionSelector, DEFAULT_CONTEXT,
};

use crate::dto::{
    schema_type_for_wire, ConfigBody, IdSubjectVersion, ImportItemDto, ImportRequest, ModeBody,
    RegisterResponse, SchemaByIdResponse, SchemaRequest, VersionResponse,
};
use crate::error::{AppError, CONTENT_TYPE};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct DeletedQuery {
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct PermanentQuery {
    #[serde(default)]
    pub permanent: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct VerboseQuery {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ModeQuery {
    #[serde(default, rename = "defaultToGlobal")]
    pub default_to_global: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListSubjectsQuery {
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, rename = "subjectPrefix")]
    pub subject_prefix: Option<String>,
}

fn parse_version_selector(raw: &str) -> Result<VersionSelector, AppError> {
    if raw.eq_ignore_ascii_case("latest") {
        Ok(VersionSelector::Latest)
    } else {
        raw.parse::<i32>()
            .map(VersionSelector::Number)
            .map_err(|_| AppError::Core(CoreError::InvalidVersion(raw.to_string())))
    }
}

fn parse_version_number(raw: &str) -> Result<i32, AppError> {
    raw.parse::<i32>()
        .map_err(|_| AppError::Core(CoreError::InvalidVersion(raw.to_string())))
}

fn version_response(
    subject: String,
    version: i32,
    record: schema_registry_core::SchemaRecord,
) -> VersionResponse {
    VersionResponse {
        subject,
        id: record.id,
        version,
        schema: record.canonical_text,
        schema_type: schema_type_for_wire(record.schema_type),
        references: record.references,
    }
}

#[tracing::instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Json(body): Json<SchemaRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let outcome = state
        .engine
        .register(&ctx, &name, body.schema_type, &body.schema, body.references, body.id)
        .await?;
    state.metrics.record_registration();
    Ok(Json(RegisterResponse { id: outcome.id }))
}

#[tracing::instrument(skip(state, body))]
pub async fn lookup(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Query(q): Query<DeletedQuery>,
    Json(body): Json<SchemaRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let outcome = state
        .engine
        .lookup(&ctx, &name, body.schema_type, &body.schema, body.references, q.deleted)
        .await?;
    Ok(Json(version_response(outcome.subject, outcome.version, outcome.schema)))
}

#[tracing::instrument(skip(state))]
pub async fn get_version(
    State(state): State<AppState>,
    Path((raw_subject, raw_version)): Path<(String, String)>,
    Query(q): Query<DeletedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let selector = parse_version_selector(&raw_version)?;
    let outcome = state.engine.get_version(&ctx, &name, selector, q.deleted).await?;
    Ok(Json(version_response(outcome.subject, outcome.version, outcome.schema)))
}

#[tracing::instrument(skip(state))]
pub async fn get_version_schema(
    State(state): State<AppState>,
    Path((raw_subject, raw_version)): Path<(String, String)>,
    Query(q): Query<DeletedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let selector = parse_version_selector(&raw_version)?;
    let outcome = state.engine.get_version(&ctx, &name, selector, q.deleted).await?;
    Ok(([("content-type", CONTENT_TYPE)], outcome.schema.canonical_text))
}

#[tracing::instrument(skip(state))]
pub async fn referenced_by(
    State(state): State<AppState>,
    Path((raw_subject, raw_version)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let version = parse_version_number(&raw_version)?;
    let ids = state.engine.referenced_by(&ctx, &name, version).await?;
    Ok(Json(ids))
}

#[tracing::instrument(skip(state))]
pub async fn delete_version(
    State(state): State<AppState>,
    Path((raw_subject, raw_version)): Path<(String, String)>,
    Query(q): Query<PermanentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let version = parse_version_number(&raw_version)?;
    let deleted = state.engine.delete_version(&ctx, &name, version, q.permanent).await?;
    Ok(Json(deleted))
}

#[tracing::instrument(skip(state))]
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Query(q): Query<PermanentQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let versions = state.engine.delete_subject(&ctx, &name, q.permanent).await?;
    Ok(Json(versions))
}

#[tracing::instrument(skip(state))]
pub async fn list_subjects(
    State(state): State<AppState>,
    Query(q): Query<ListSubjectsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ctx = match &q.subject_prefix {
        Some(prefix) => SubjectRef::parse(prefix).context().to_string(),
        None => DEFAULT_CONTEXT.to_string(),
    };
    let subjects = state.engine.list_subjects(&ctx, q.deleted).await?;
    Ok(Json(subjects))
}

#[tracing::instrument(skip(state))]
pub async fn list_versions(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Query(q): Query<DeletedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let versions = state.engine.list_versions(&ctx, &name, q.deleted).await?;
    Ok(Json(versions))
}

#[tracing::instrument(skip(state, body))]
pub async fn check_compatibility_version(
    State(state): State<AppState>,
    Path((raw_subject, raw_version)): Path<(String, String)>,
    Query(q): Query<VerboseQuery>,
    Json(body): Json<SchemaRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let version = parse_version_number(&raw_version)?;
    let outcome = state
        .engine
        .check_compatibility(
            &ctx,
            &name,
            CompatibilityTarget::Specific(version),
            body.schema_type,
            &body.schema,
            body.references,
            q.verbose,
        )
        .await?;
    state.metrics.record_compatibility_check();
    Ok(Json(outcome))
}

#[tracing::instrument(skip(state, body))]
pub async fn check_compatibility_all(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Query(q): Query<VerboseQuery>,
    Json(body): Json<SchemaRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let outcome = state
        .engine
        .check_compatibility(
            &ctx,
            &name,
            CompatibilityTarget::AllVersions,
            body.schema_type,
            &body.schema,
            body.references,
            q.verbose,
        )
        .await?;
    state.metrics.record_compatibility_check();
    Ok(Json(outcome))
}

pub async fn get_global_config(State(state): State<AppState>) -> impl IntoResponse {
    let compatibility = state.engine.resolve_config(DEFAULT_CONTEXT, None).await;
    Json(ConfigBody { compatibility })
}

pub async fn put_global_config(
    State(state): State<AppState>,
    Json(body): Json<ConfigBody>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.set_config(DEFAULT_CONTEXT, None, body.compatibility).await?;
    Ok(Json(body))
}

pub async fn get_subject_config(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
) -> impl IntoResponse {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let compatibility = state.engine.resolve_config(&ctx, Some(&name)).await;
    Json(ConfigBody { compatibility })
}

pub async fn put_subject_config(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Json(body): Json<ConfigBody>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    state.engine.set_config(&ctx, Some(&name), body.compatibility).await?;
    Ok(Json(body))
}

pub async fn delete_subject_config(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let compatibility = state.engine.delete_config(&ctx, Some(&name)).await?;
    Ok(Json(ConfigBody { compatibility }))
}

pub async fn get_global_mode(State(state): State<AppState>) -> impl IntoResponse {
    let mode = state.engine.resolve_mode(DEFAULT_CONTEXT, None).await;
    Json(ModeBody { mode })
}

pub async fn put_global_mode(
    State(state): State<AppState>,
    Json(body): Json<ModeBody>,
) -> Result<impl IntoResponse, AppError> {
    state.engine.set_mode(DEFAULT_CONTEXT, None, body.mode).await?;
    Ok(Json(body))
}

/// Without `defaultToGlobal`, only a set per-subject override is returned;
/// absent one, this is a 404 rather than the resolved fallback value (§4.6).
pub async fn get_subject_mode(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Query(q): Query<ModeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let mode = if q.default_to_global {
        state.engine.resolve_mode(&ctx, Some(&name)).await
    } else {
        state
            .engine
            .get_mode(&ctx, Some(&name))
            .await
            .ok_or_else(|| CoreError::ModeNotConfigured(name.clone()))?
    };
    Ok(Json(ModeBody { mode }))
}

pub async fn put_subject_mode(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
    Json(body): Json<ModeBody>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    state.engine.set_mode(&ctx, Some(&name), body.mode).await?;
    Ok(Json(body))
}

pub async fn delete_subject_mode(
    State(state): State<AppState>,
    Path(raw_subject): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let subject_ref = SubjectRef::parse(&raw_subject);
    let (ctx, name) = subject_ref.context_and_name();
    let mode = state.engine.delete_mode(&ctx, Some(&name)).await?;
    Ok(Json(ModeBody { mode }))
}

pub async fn list_contexts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let contexts = state.engine.list_contexts().await?;
    Ok(Json(contexts))
}

pub async fn schema_types() -> impl IntoResponse {
    Json([SchemaType::Avro, SchemaType::Protobuf, SchemaType::Json])
}

pub async fn get_schema_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.engine.get_by_id(id).await?;
    Ok(Json(SchemaByIdResponse {
        schema: record.canonical_text,
        schema_type: schema_type_for_wire(record.schema_type),
        references: record.references,
    }))
}

pub async fn get_schema_by_id_raw(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let record = state.engine.get_by_id(id).await?;
    Ok(([("content-type", CONTENT_TYPE)], record.canonical_text))
}

pub async fn subjects_for_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<DeletedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let subjects = state.engine.subjects_for_id(id, q.deleted).await?;
    Ok(Json(subjects))
}

pub async fn versions_for_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<DeletedQuery>,
) -> Result<impl IntoResponse, AppError> {
    let versions = state.engine.versions_for_id(id, q.deleted).await?;
    let body: Vec<IdSubjectVersion> = versions
        .into_iter()
        .map(|(subject, version)| IdSubjectVersion { subject, version })
        .collect();
    Ok(Json(body))
}

pub async fn import_bulk(
    State(state): State<AppState>,
    Json(body): Json<ImportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let items = body.items.into_iter().map(ImportItemDto::into).collect();
    let summary = state.engine.import_bulk(items).await?;
    Ok(Json(summary))
}

pub async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let buffer = state.metrics.encode();
    (StatusCode::OK, [("content-type", "text/plain; version=0.0.4")], buffer)
}
