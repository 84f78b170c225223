use std::sync::Arc;

use api_router::{api_routes_v1, api_state::ApiState};
use axum::Router;
use common::{storage::db::SurrealDbClient, storage::store::StorageManager, utils::config::get_config};
use ingestion_pipeline::{run_worker_loop, JobOrchestrator};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Single-process binary: runs the API server and the ingestion worker loop
/// side by side (spec.md §1 "a small service", single deployable for
/// environments that don't need `server`/`worker` scaled independently).
#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;

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

    let storage = StorageManager::new(&config).await?;
    let api_state = ApiState::new(&config, storage.clone()).await?;

    let openai_client = async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    );
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
        Arc::new(storage),
        Arc::new(config.clone()),
        embedder_for,
    ));

    let app = Router::new().nest("/api/v1", api_routes_v1(&api_state).with_state(api_state));

    let serve_address = format!("0.0.0.0:{}", config.http_port);
    info!(address = %serve_address, "starting api server");
    let listener = tokio::net::TcpListener::bind(serve_address).await?;

    tokio::select! {
        result = axum::serve(listener, app) => result.map_err(Into::into),
        result = run_worker_loop(db, orchestrator) => result,
    }
}
