use api_router::{api_routes_v1, api_state::ApiState};
use axum::Router;
use common::{storage::store::StorageManager, utils::config::get_config};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// API-only binary: `/api/v1/{chat,healthz,uploads,ingest/jobs}` (spec.md
/// §6). Ingestion jobs are only claimed by the `worker` binary — this
/// process never runs `run_worker_loop`, so it can be scaled independently.
#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = get_config()?;
    let storage = StorageManager::new(&config).await?;
    let api_state = ApiState::new(&config, storage).await?;

    let app = Router::new().nest("/api/v1", api_routes_v1(&api_state).with_state(api_state));

    let serve_address = format!("0.0.0.0:{}", config.http_port);
    info!(address = %serve_address, "starting api server");
    let listener = tokio::net::TcpListener::bind(serve_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
