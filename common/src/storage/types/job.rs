use serde::{Deserialize, Serialize};

use crate::stored_object;

/// Terminal states are ALL CAPS (spec.md §3 `Job`): `queued` → `running` →
/// (`SUCCEEDED` | `FAILED`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[serde(rename = "queued")]
    Queued,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "FAILED")]
    Failed,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobOptions {
    #[serde(default)]
    pub update_alias: bool,
    #[serde(default)]
    pub evaluate: bool,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lang_hint: Option<String>,
    #[serde(default)]
    pub domain_key: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobProgress {
    #[serde(default)]
    pub files_total: u32,
    #[serde(default)]
    pub files_processed: u32,
    #[serde(default)]
    pub chunks_total: u64,
    #[serde(default)]
    pub chunks_indexed: u64,
    #[serde(default)]
    pub dedupe_skipped: u64,
    #[serde(default)]
    pub logs_tail: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(default)]
    pub promotion_blocked: bool,
    #[serde(default)]
    pub hit_rate: Option<f32>,
    #[serde(default)]
    pub mrr: Option<f32>,
    #[serde(default)]
    pub phrase_hit_rate: Option<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobError {
    /// One of spec.md §4.5's job error codes: `upload_missing`,
    /// `unknown_profile`, `schema_drift`, `embed_failed`, `upsert_failed`,
    /// `alias_failed`, `eval_failed`.
    pub code: String,
    pub message: String,
}

stored_object!(Job, "job", {
    profile: String,
    upload_ids: Vec<String>,
    options: JobOptions,
    status: JobStatus,
    started_at: Option<chrono::DateTime<chrono::Utc>>,
    finished_at: Option<chrono::DateTime<chrono::Utc>>,
    progress: JobProgress,
    summary: JobSummary,
    metrics: serde_json::Value,
    error: Option<JobError>
});

impl Job {
    pub fn job_id(&self) -> &str {
        &self.id
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::db::SurrealDbClient;
    use chrono::Utc;
    use uuid::Uuid;

    fn new_job(id: &str) -> Job {
        Job {
            id: id.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            profile: "legacy_profile".to_string(),
            upload_ids: vec!["up_1".to_string()],
            options: JobOptions::default(),
            status: JobStatus::Queued,
            started_at: None,
            finished_at: None,
            progress: JobProgress::default(),
            summary: JobSummary::default(),
            metrics: serde_json::json!({}),
            error: None,
        }
    }

    #[tokio::test]
    async fn stores_and_fetches_job() {
        let db = SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string())
            .await
            .unwrap();

        let job = new_job("job_1");
        db.store_item(job.clone()).await.unwrap();
        let fetched = db.get_item::<Job>("job_1").await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Queued);
        assert!(!fetched.is_terminal());
    }

    #[test]
    fn status_serializes_to_spec_casing() {
        assert_eq!(serde_json::to_string(&JobStatus::Queued).unwrap(), "\"queued\"");
        assert_eq!(serde_json::to_string(&JobStatus::Succeeded).unwrap(), "\"SUCCEEDED\"");
        assert_eq!(serde_json::to_string(&JobStatus::Failed).unwrap(), "\"FAILED\"");
    }
}
