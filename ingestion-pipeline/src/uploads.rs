use bytes::Bytes;
use common::{
    error::AppError,
    storage::{db::SurrealDbClient, store::StorageManager, types::upload_record::UploadRecord},
    utils::{config::IngestLimits, ingest_limits::validate_upload},
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// `POST /uploads` (spec.md §6.2): validates size/mime, persists the blob
/// under a staging prefix keyed by a freshly minted `upload_id`, and writes
/// the upload's metadata record.
pub async fn create_upload(
    db: &SurrealDbClient,
    storage: &StorageManager,
    limits: &IngestLimits,
    filename: &str,
    mime: &str,
    bytes: Bytes,
    source_tag: Option<String>,
    declared_tags: Vec<String>,
    lang_hint: Option<String>,
) -> Result<UploadRecord, AppError> {
    validate_upload(limits, bytes.len() as u64, mime)?;

    let upload_id = format!("up_{}", Uuid::new_v4());
    let storage_path = format!("uploads/{upload_id}/{filename}");
    let sha256 = hex_sha256(&bytes);
    let byte_len = bytes.len() as u64;

    storage.put(&storage_path, bytes).await.map_err(|e| AppError::StoreFailed {
        transient: false,
        message: e.to_string(),
    })?;

    let record = UploadRecord {
        id: upload_id,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
        filename: filename.to_string(),
        bytes: byte_len,
        mime: mime.to_string(),
        sha256,
        storage_path,
        source_tag,
        declared_tags,
        lang_hint,
    };

    db.store_item(record.clone()).await.map_err(AppError::Database)?;
    Ok(record)
}

/// `GET /uploads/{id}`.
pub async fn get_upload(db: &SurrealDbClient, id: &str) -> Result<UploadRecord, AppError> {
    db.get_item(id)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("upload {id}")))
}

fn hex_sha256(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
