use std::collections::HashSet;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{
            job::{Job, JobOptions, JobProgress, JobStatus, JobSummary},
            upload_record::UploadRecord,
        },
    },
    utils::config::AppConfig,
};
use uuid::Uuid;

/// `POST /ingest/jobs` (spec.md §6.2): validates the upload set and profile,
/// rejects an overlapping in-flight job, and enqueues a new `Job` in
/// `queued`. The worker loop (`run_worker_loop`) picks it up from there.
pub async fn create_job(
    db: &SurrealDbClient,
    config: &AppConfig,
    upload_ids: Vec<String>,
    profile: String,
    options: JobOptions,
) -> Result<Job, AppError> {
    if upload_ids.is_empty() {
        return Err(AppError::BadRequest("upload_ids must not be empty".to_string()));
    }
    let unique: HashSet<&String> = upload_ids.iter().collect();
    if unique.len() != upload_ids.len() {
        return Err(AppError::BadRequest("upload_ids contains duplicates".to_string()));
    }

    config.profile(&profile)?;
    if let Some(domain_key) = &options.domain_key {
        config.domain(domain_key)?;
    }

    for upload_id in &upload_ids {
        let exists = db
            .get_item::<UploadRecord>(upload_id)
            .await
            .map_err(AppError::Database)?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("upload {upload_id}")));
        }
    }

    if let Some(conflicting) = find_overlapping_running_job(db, &upload_ids).await? {
        return Err(AppError::Conflict(format!(
            "job {conflicting} already holds one or more of these uploads"
        )));
    }

    let job = Job {
        id: format!("job_{}", Uuid::new_v4()),
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
        profile,
        upload_ids,
        options,
        status: JobStatus::Queued,
        started_at: None,
        finished_at: None,
        progress: JobProgress::default(),
        summary: JobSummary::default(),
        metrics: serde_json::json!({}),
        error: None,
    };

    db.store_item(job.clone()).await.map_err(AppError::Database)?;
    Ok(job)
}

/// A running job holds a logical lock on the uploads it references
/// (spec.md §3 `Job` ownership rules); a new job naming any of the same
/// uploads is rejected with `409 conflict` rather than queued behind it.
async fn find_overlapping_running_job(
    db: &SurrealDbClient,
    upload_ids: &[String],
) -> Result<Option<String>, AppError> {
    let running: Vec<Job> = db
        .client
        .query("SELECT * FROM job WHERE status IN ['queued', 'running'];")
        .await
        .map_err(AppError::Database)?
        .take(0)
        .map_err(AppError::Database)?;

    for job in running {
        if job.upload_ids.iter().any(|id| upload_ids.contains(id)) {
            return Ok(Some(job.id));
        }
    }
    Ok(None)
}

/// `GET /ingest/jobs/{id}`.
pub async fn get_job(db: &SurrealDbClient, id: &str) -> Result<Job, AppError> {
    db.get_item(id)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("job {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn db_with_upload(upload_id: &str) -> SurrealDbClient {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .unwrap();
        let record = UploadRecord {
            id: upload_id.to_string(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            filename: "fiber_manual.pdf".to_string(),
            bytes: 10,
            mime: "application/pdf".to_string(),
            sha256: "abc".to_string(),
            storage_path: "uploads/up_1/fiber_manual.pdf".to_string(),
            source_tag: None,
            declared_tags: vec![],
            lang_hint: None,
        };
        db.store_item(record).await.unwrap();
        db
    }

    fn config_with_profile(name: &str) -> AppConfig {
        use common::config::profile::{ChunkerKind, ChunkerParams, Profile};
        use common::config::retrieval_config::Distance;
        use std::collections::HashMap;

        let mut profiles = HashMap::new();
        profiles.insert(
            name.to_string(),
            Profile {
                name: name.to_string(),
                chunker_kind: ChunkerKind::Char,
                chunker: ChunkerParams::default(),
                distance: Distance::Cosine,
                metadata_keep_list: Default::default(),
                batching: Default::default(),
                dedupe_by_hash: true,
                index_name: "demo".to_string(),
                alias_name: "demo".to_string(),
                ocr: false,
                embedding_model: "text-embedding-3-small".to_string(),
                embedding_dimensions: 3,
                eval_queries_path: None,
                eval_min_hit_rate: None,
            },
        );

        use common::utils::config::{EmbeddingsSettings, StorageKind};

        AppConfig {
            openai_api_key: "test".to_string(),
            surrealdb_address: "mem://".to_string(),
            surrealdb_username: "test".to_string(),
            surrealdb_password: "test".to_string(),
            surrealdb_namespace: "test".to_string(),
            surrealdb_database: "test".to_string(),
            data_dir: "/tmp".to_string(),
            http_port: 0,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            storage: StorageKind::Local,
            retrieval: Default::default(),
            embeddings: EmbeddingsSettings {
                profiles,
                ..Default::default()
            },
            sanitiser: Default::default(),
            ingest: Default::default(),
            assets: Default::default(),
        }
    }

    #[tokio::test]
    async fn rejects_empty_upload_ids() {
        let db = db_with_upload("up_1").await;
        let cfg = config_with_profile("legacy_profile");
        let result = create_job(&db, &cfg, vec![], "legacy_profile".to_string(), JobOptions::default()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn rejects_missing_upload() {
        let db = db_with_upload("up_1").await;
        let cfg = config_with_profile("legacy_profile");
        let result = create_job(
            &db,
            &cfg,
            vec!["up_missing".to_string()],
            "legacy_profile".to_string(),
            JobOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn rejects_overlapping_running_job() {
        let db = db_with_upload("up_1").await;
        let cfg = config_with_profile("legacy_profile");

        let first = create_job(
            &db,
            &cfg,
            vec!["up_1".to_string()],
            "legacy_profile".to_string(),
            JobOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(first.status, JobStatus::Queued);

        let second = create_job(
            &db,
            &cfg,
            vec!["up_1".to_string()],
            "legacy_profile".to_string(),
            JobOptions::default(),
        )
        .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }
}
