#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod cleaning;
pub mod jobs;
pub mod loaders;
pub mod manifest;
pub mod pipeline;
pub mod uploads;

use std::sync::Arc;

use common::storage::{db::SurrealDbClient, types::job::Job};
pub use pipeline::{context::JobContext, IngestionConfig, IngestionTuning, JobOrchestrator};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

const IDLE_BACKOFF: Duration = Duration::from_millis(500);
const CLAIM_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Claims at most one `queued` job and flips it to `running` in a single
/// statement, so two workers racing the same poll never both claim it
/// (spec.md §4.5 "single worker per job").
async fn claim_next_job(db: &SurrealDbClient) -> Result<Option<Job>, surrealdb::Error> {
    let mut response = db
        .client
        .query(
            "UPDATE job SET status = 'running', started_at = time::now() \
             WHERE status = 'queued' LIMIT 1 RETURN AFTER;",
        )
        .await?;
    let mut jobs: Vec<Job> = response.take(0)?;
    Ok(jobs.pop())
}

/// Polls for queued jobs and runs each as its own task, so job bodies run
/// concurrently with each other while a single loop does the claiming
/// (spec.md §4.5 ordering guarantee: "single worker per job").
pub async fn run_worker_loop(
    db: Arc<SurrealDbClient>,
    orchestrator: Arc<JobOrchestrator>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match claim_next_job(&db).await {
            Ok(Some(job)) => {
                let job_id = job.id.clone();
                info!(%job_id, profile = %job.profile, "claimed ingestion job");
                let orchestrator = Arc::clone(&orchestrator);
                tokio::spawn(async move {
                    if let Err(err) = orchestrator.run(job).await {
                        error!(%job_id, error = %err, "ingestion job runner failed to persist terminal state");
                    }
                });
            }
            Ok(None) => {
                sleep(IDLE_BACKOFF).await;
            }
            Err(err) => {
                error!(error = %err, "failed to claim ingestion job");
                warn!("backing off after claim error");
                sleep(CLAIM_ERROR_BACKOFF).await;
            }
        }
    }
}
