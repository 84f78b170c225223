use api_state::ApiState;
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};
use routes::{chat::chat, healthz::healthz, jobs, uploads};

pub mod api_state;
pub mod error;
mod routes;

/// Router for API functionality, version 1 (spec.md §6: `/chat`, `/healthz`,
/// `/uploads`, `/uploads/{id}`, `/ingest/jobs`, `/ingest/jobs/{id}`). No
/// auth middleware — the teacher's `api_auth` gated every route behind an
/// API-key lookup that has no counterpart here.
pub fn api_routes_v1<S>(app_state: &ApiState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    ApiState: FromRef<S>,
{
    Router::new()
        .route("/healthz", get(healthz))
        .route("/chat", post(chat))
        .route(
            "/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(
                app_state.config.ingest.max_upload_bytes() as usize,
            )),
        )
        .route("/uploads/{id}", get(uploads::get))
        .route("/ingest/jobs", post(jobs::create))
        .route("/ingest/jobs/{id}", get(jobs::get))
}
