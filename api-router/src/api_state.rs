use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use common::{
    storage::{db::SurrealDbClient, store::StorageManager},
    utils::{config::AppConfig, embedding::Embedder},
};
use retrieval_pipeline::{AnswerContext, LlmClient};

/// Composite application state shared by every route (spec.md §9
/// "request-time singletons"): one `SurrealDbClient`, one `StorageManager`,
/// one `AnswerContext` built once at startup from the active profile's
/// embedding settings, not reconstructed per request.
#[derive(Clone)]
pub struct ApiState {
    pub db: Arc<SurrealDbClient>,
    pub config: AppConfig,
    pub storage: StorageManager,
    pub answer_ctx: AnswerContext,
}

impl ApiState {
    pub async fn new(config: &AppConfig, storage: StorageManager) -> Result<Self, Box<dyn std::error::Error>> {
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

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url);
        let openai_client = Client::with_config(openai_config);

        let active_profile = config.profile(&config.embeddings.active_profile)?;
        let embedder = Embedder::new(
            openai_client.clone(),
            active_profile.embedding_model.clone(),
            active_profile.embedding_dimensions as u32,
            active_profile.batching.batch_size,
            active_profile.batching.rate_limit_per_min,
        );

        let llm_primary = LlmClient::new(openai_client.clone(), config.retrieval.prompts.model_primary.clone());
        let llm_fallback = LlmClient::new(openai_client, config.retrieval.prompts.model_fallback.clone());

        let answer_ctx = AnswerContext::new(
            db.clone(),
            embedder,
            llm_primary,
            llm_fallback,
            config.retrieval.clone(),
            config.embeddings.alias.name.clone(),
            config.embeddings.domains.clone(),
        );

        Ok(Self {
            db,
            config: config.clone(),
            storage,
            answer_ctx,
        })
    }
}
