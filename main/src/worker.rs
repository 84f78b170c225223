use std::sync::Arc;

use common::{storage::db::SurrealDbClient, storage::store::StorageManager, utils::config::get_config};
use ingestion_pipeline::{run_worker_loop, JobOrchestrator};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Worker-only binary: claims queued ingestion jobs and runs them to
/// completion (spec.md §4.5), independent of the API process.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = Arc::new(get_config()?);

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );

    let openai_client = async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    );

    let storage = Arc::new(StorageManager::new(&config).await?);

    let embedder_for = Arc::new(move |profile: &common::config::profile::Profile| {
        common::utils::embedding::Embedder::new(
            openai_client.clone(),
            profile.embedding_model.clone(),
            profile.embedding_dimensions as u32,
            profile.batching.batch_size,
            profile.batching.rate_limit_per_min,
        )
    });

    let orchestrator = Arc::new(JobOrchestrator::new(
        db.clone(),
        storage,
        config,
        embedder_for,
    ));

    run_worker_loop(db, orchestrator).await
}
