use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use common::storage::types::job::{Job, JobOptions};
use ingestion_pipeline::jobs::{create_job, get_job};
use serde::Deserialize;

use crate::{api_state::ApiState, error::ApiError};

/// `POST /ingest/jobs` request body (spec.md §6.2).
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub upload_ids: Vec<String>,
    pub profile: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lang_hint: Option<String>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub update_alias: bool,
    #[serde(default)]
    pub evaluate: bool,
    #[serde(default)]
    pub domain_key: Option<String>,
}

pub async fn create(State(state): State<ApiState>, Json(body): Json<CreateJobRequest>) -> Result<impl IntoResponse, ApiError> {
    let options = JobOptions {
        update_alias: body.update_alias,
        evaluate: body.evaluate,
        priority: body.priority,
        tags: body.tags,
        lang_hint: body.lang_hint,
        domain_key: body.domain_key,
    };

    let job = create_job(&state.db, &state.config, body.upload_ids, body.profile, options).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

pub async fn get(State(state): State<ApiState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let job: Job = get_job(&state.db, &id).await?;
    Ok(Json(job))
}
