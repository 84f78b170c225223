use axum::{extract::State, http::{HeaderMap, StatusCode}, response::IntoResponse, Json};
use retrieval_pipeline::{answer, Mode};
use serde::Deserialize;

use crate::{api_state::ApiState, error::ApiError};

/// `POST /chat` request body (spec.md §6.1).
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

pub async fn chat(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let domain_key = headers.get("X-RAG-Domain").and_then(|v| v.to_str().ok());
    let response = answer(&state.answer_ctx, &body.question, domain_key).await?;

    let mode_header = match response.mode {
        Mode::Rag => "rag",
        Mode::Hybrid => "hybrid",
        Mode::Fallback => "fallback",
    };

    Ok((StatusCode::OK, [("X-Answer-Mode", mode_header)], Json(response)))
}
