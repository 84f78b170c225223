use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use common::storage::types::upload_record::UploadRecord;
use ingestion_pipeline::uploads::{create_upload, get_upload};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::{api_state::ApiState, error::ApiError};

/// `POST /uploads` multipart fields (spec.md §6.2): `file` is required,
/// `source`/`tags`/`lang_hint` are optional.
#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    #[form_data(limit = "unlimited")]
    pub file: FieldData<NamedTempFile>,
    pub source: Option<String>,
    #[form_data(default)]
    pub tags: Vec<String>,
    pub lang_hint: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub upload_id: String,
    pub filename: String,
    pub size_bytes: u64,
    pub content_type: String,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub lang_hint: Option<String>,
    pub storage_path: String,
    pub checksum_sha256: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<UploadRecord> for UploadResponse {
    fn from(record: UploadRecord) -> Self {
        Self {
            upload_id: record.id,
            filename: record.filename,
            size_bytes: record.bytes,
            content_type: record.mime,
            source: record.source_tag,
            tags: record.declared_tags,
            lang_hint: record.lang_hint,
            storage_path: record.storage_path,
            checksum_sha256: record.sha256,
            created_at: record.created_at,
        }
    }
}

pub async fn upload(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let filename = input
        .file
        .metadata
        .file_name
        .unwrap_or_else(|| "upload.bin".to_string());
    let mime = input
        .file
        .metadata
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let bytes = tokio::fs::read(input.file.contents.path())
        .await
        .map_err(common::error::AppError::Io)?;

    let record = create_upload(
        &state.db,
        &state.storage,
        &state.config.ingest,
        &filename,
        &mime,
        bytes.into(),
        input.source,
        input.tags,
        input.lang_hint,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UploadResponse::from(record))))
}

pub async fn get(State(state): State<ApiState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let record = get_upload(&state.db, &id).await?;
    Ok(Json(UploadResponse::from(record)))
}
