use std::collections::HashMap;
use std::sync::Arc;

use common::{
    config::{domain::Domain, retrieval_config::RetrievalConfig},
    storage::{db::SurrealDbClient, vector_store::VectorStore},
    utils::embedding::Embedder,
};

use crate::llm::LlmClient;

/// Request-independent dependencies the retrieval service needs, built once
/// at startup (spec.md §9 "request-time singletons" — no module-level
/// globals, a single context value threaded through by reference).
#[derive(Clone)]
pub struct AnswerContext {
    pub vector_store: VectorStore,
    pub embedder: Embedder,
    /// `L-primary` (spec.md §4.6 step 9).
    pub llm_primary: LlmClient,
    /// `L-fallback` (spec.md §4.6 step 10). Usually the same model as
    /// `llm_primary`, kept distinct so a cheaper/steadier model can be
    /// configured for the no-context retry.
    pub llm_fallback: LlmClient,
    pub config: RetrievalConfig,
    pub default_alias: String,
    pub domains: HashMap<String, Domain>,
}

impl AnswerContext {
    pub fn new(
        db: Arc<SurrealDbClient>,
        embedder: Embedder,
        llm_primary: LlmClient,
        llm_fallback: LlmClient,
        config: RetrievalConfig,
        default_alias: String,
        domains: HashMap<String, Domain>,
    ) -> Self {
        Self {
            vector_store: VectorStore::new(db),
            embedder,
            llm_primary,
            llm_fallback,
            config,
            default_alias,
            domains,
        }
    }
}
