use std::sync::Arc;

use chrono::Utc;
use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        store::StorageManager,
        types::job::{Job, JobError, JobStatus},
        vector_store::VectorStore,
    },
    utils::{config::AppConfig, embedding::Embedder},
};
use sanitizer::Sanitizer;
use tracing::warn;

/// Everything one job run needs, bundled so orchestrator methods don't carry
/// eight separate parameters (mirrors the teacher's `PipelineContext`, scoped
/// to a `Job` instead of an `IngestionTask`).
pub struct JobContext {
    pub job: Job,
    pub db: Arc<SurrealDbClient>,
    pub vector_store: VectorStore,
    pub embedder: Embedder,
    pub sanitizer: Sanitizer,
    pub storage: Arc<StorageManager>,
    pub config: Arc<AppConfig>,
    logs_tail_lines: usize,
}

impl JobContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job: Job,
        db: Arc<SurrealDbClient>,
        vector_store: VectorStore,
        embedder: Embedder,
        sanitizer: Sanitizer,
        storage: Arc<StorageManager>,
        config: Arc<AppConfig>,
        logs_tail_lines: usize,
    ) -> Self {
        Self {
            job,
            db,
            vector_store,
            embedder,
            sanitizer,
            storage,
            config,
            logs_tail_lines,
        }
    }

    /// Appends a line to `Job.progress.logs_tail`, bounded to the
    /// configured tail length (oldest lines drop off first).
    pub fn log(&mut self, line: impl Into<String>) {
        let tail = &mut self.job.progress.logs_tail;
        tail.push(line.into());
        if tail.len() > self.logs_tail_lines {
            let excess = tail.len() - self.logs_tail_lines;
            tail.drain(0..excess);
        }
    }

    /// Persists the current `Job` snapshot (status/progress/summary as they
    /// stand right now). Called after each document and at every milestone
    /// so `GET /ingest/jobs/{id}` never blocks on the run completing.
    pub async fn checkpoint(&self) -> Result<(), AppError> {
        self.db
            .upsert_item(self.job.clone())
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    /// Marks the job `FAILED` with a typed error code and persists it. Per
    /// spec.md §4.5, this is terminal: there is no automatic retry, and the
    /// alias is never repointed afterward.
    pub async fn fail(&mut self, err: &AppError) -> Result<(), AppError> {
        let code = err.job_error_code().to_string();
        warn!(job_id = %self.job.id, error = %err, code = %code, "job failed");
        self.log(format!("FAILED: {code}: {err}"));
        self.job.status = JobStatus::Failed;
        self.job.finished_at = Some(Utc::now());
        self.job.error = Some(JobError {
            code,
            message: err.to_string(),
        });
        self.checkpoint().await
    }
}
