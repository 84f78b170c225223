use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// `GET /healthz` (spec.md §6.1): always `200`. Reports the configured API
/// key as the liveness signal for each outbound dependency rather than
/// issuing a live network round-trip per health check — embeddings and
/// both LLM clients share the same OpenAI credential in this deployment.
pub async fn healthz(State(state): State<ApiState>) -> impl IntoResponse {
    let status = if state.config.openai_api_key.is_empty() {
        "down (missing api key)"
    } else {
        "up"
    };

    Json(json!({
        "ok": true,
        "services": {
            "embeddings": status,
            "llm_primary": status,
            "llm_fallback": status,
        }
    }))
}
