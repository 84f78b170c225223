pub mod context;

use common::{
    config::retrieval_config::{Distance, ScoreMode},
    error::AppError,
};
use tracing::{info, instrument};

use crate::{
    response::{DecisionExplain, Mode, Response, RetrievedChunkMetadata, SourcesUsed, UsedChunk},
    scoring::{sort_and_dedupe, to_similarity, DedupeKey, ScoredHit},
};

use self::context::AnswerContext;

const SNIPPET_CHARS: usize = 300;
const PREVIEW_CHARS: usize = 200;

/// Runs the full retrieval-and-answer algorithm (spec.md §4.6). One linear
/// pass, no strategy branching — every request follows the same eleven
/// steps; only the thresholds and prompt selected along the way differ.
#[instrument(skip(ctx), fields(domain_key))]
pub async fn answer(ctx: &AnswerContext, question: &str, domain_key: Option<&str>) -> Result<Response, AppError> {
    // Step 1: normalise question.
    let effective_query = question.trim().to_string();
    if effective_query.is_empty() {
        return Err(AppError::BadRequest("question must not be empty".to_string()));
    }

    // Step 2: select view.
    let view = select_view(ctx, domain_key)?;

    // Step 3: search.
    let query_vector = ctx.embedder.embed_query(&effective_query).await?;
    let rows = ctx
        .vector_store
        .similarity_search(&view, &query_vector, ctx.config.top_k)
        .await?;

    // Step 4: normalise scores.
    let scored: Vec<ScoredHit> = rows
        .into_iter()
        .map(|hit| {
            let similarity = to_similarity(hit.raw_score, ctx.config.distance, ctx.config.score_mode);
            ScoredHit { hit, similarity }
        })
        .collect();

    // Step 5: short-query check.
    let short_query_active = count_alphabetic_tokens(question) <= ctx.config.short_query.max_tokens;
    let (threshold_low, threshold_high) = ctx.config.thresholds(short_query_active);

    let max_similarity = scored.iter().map(|s| s.similarity).fold(0.0_f32, f32::max);

    // Step 6: mode decision.
    let mut mode = if max_similarity >= threshold_high {
        Mode::Rag
    } else if max_similarity >= threshold_low {
        Mode::Hybrid
    } else {
        Mode::Fallback
    };
    let mut reason = match mode {
        Mode::Fallback => Some("below_threshold_low".to_string()),
        _ => None,
    };

    // Step 7: context assembly (rag/hybrid only).
    let mut context_chunks: Vec<ScoredHit> = Vec::new();
    if mode != Mode::Fallback {
        context_chunks = assemble_context(ctx, &scored);
    }

    // Step 8: hybrid gates.
    if mode == Mode::Hybrid {
        if let Some(gate_failure) = check_hybrid_gates(ctx, max_similarity, &context_chunks) {
            mode = Mode::Fallback;
            reason = Some(gate_failure);
            context_chunks.clear();
        }
    }

    // Step 9: prompting.
    let system_prompt = match mode {
        Mode::Rag => ctx.config.prompts.rag.as_str(),
        Mode::Hybrid => ctx.config.prompts.hybrid.as_str(),
        Mode::Fallback => ctx.config.prompts.fallback.as_str(),
    };
    let user_message = build_user_message(&context_chunks, &effective_query);
    let used_llm = true;
    let mut raw_answer = ctx
        .llm_primary
        .complete(system_prompt, &user_message, ctx.config.prompts.max_output_tokens)
        .await?;

    // Step 10: post-LLM fallback.
    let trimmed = raw_answer.trim();
    if mode != Mode::Fallback && (trimmed.is_empty() || trimmed == ctx.config.prompts.no_context_token) {
        reason = Some(if trimmed.is_empty() {
            "llm_empty".to_string()
        } else {
            "llm_no_context_token".to_string()
        });
        mode = Mode::Fallback;
        context_chunks.clear();
        raw_answer = ctx
            .llm_fallback
            .complete(&ctx.config.prompts.fallback, &effective_query, ctx.config.prompts.max_output_tokens)
            .await?;
    }

    info!(mode = ?mode, max_similarity, short_query_active, "answered question");

    // Step 11: build response.
    Ok(build_response(
        question,
        raw_answer,
        &scored,
        &context_chunks,
        mode,
        reason,
        &view,
        effective_query,
        short_query_active,
        max_similarity,
        threshold_low,
        threshold_high,
        used_llm,
        ctx,
    ))
}

fn select_view(ctx: &AnswerContext, domain_key: Option<&str>) -> Result<String, AppError> {
    match domain_key {
        Some(key) => {
            let domain = ctx
                .domains
                .get(key)
                .ok_or_else(|| AppError::UnknownDomain(key.to_string()))?;
            Ok(domain.alias_name.clone())
        }
        None => Ok(ctx.default_alias.clone()),
    }
}

/// Lowercases, strips punctuation, and counts alphabetic tokens (spec.md
/// §4.6 step 5). Counting against the raw question (not the trimmed
/// `effective_query`) makes no difference in practice since trimming only
/// removes surrounding whitespace.
fn count_alphabetic_tokens(question: &str) -> usize {
    question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty() && token.chars().any(|c| c.is_alphabetic()))
        .count()
}

fn assemble_context(ctx: &AnswerContext, scored: &[ScoredHit]) -> Vec<ScoredHit> {
    let excluded = &ctx.config.hybrid.exclude_chunk_types_from_llm;
    let candidates: Vec<ScoredHit> = scored
        .iter()
        .filter(|s| !excluded.contains(&s.hit.chunk.kind.label().to_string()))
        .filter(|s| token_count(&s.hit.chunk.text) >= ctx.config.hybrid.min_tokens_per_chunk)
        .cloned()
        .collect();

    let deduped = sort_and_dedupe(candidates, DedupeKey::DocId, None);

    let mut selected = Vec::new();
    let mut total_chars = 0usize;
    for candidate in deduped {
        if selected.len() >= ctx.config.hybrid.max_chunks {
            break;
        }
        let chunk_len = candidate.hit.chunk.text.len();
        if total_chars + chunk_len > ctx.config.hybrid.max_context_chars && !selected.is_empty() {
            break;
        }
        total_chars += chunk_len;
        selected.push(candidate);
    }
    selected
}

fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Returns the failed-gate reason code, or `None` if every gate passed
/// (spec.md §4.6 step 8).
fn check_hybrid_gates(ctx: &AnswerContext, max_similarity: f32, context_chunks: &[ScoredHit]) -> Option<String> {
    let gates = &ctx.config.hybrid;
    if max_similarity < gates.min_similarity_for_hybrid {
        return Some("gate_failed_min_similarity".to_string());
    }
    if context_chunks.len() < gates.min_chunks_for_hybrid {
        return Some("gate_failed_min_chunks".to_string());
    }
    let total_chars: usize = context_chunks.iter().map(|c| c.hit.chunk.text.len()).sum();
    if total_chars < gates.min_total_context_chars {
        return Some("gate_failed_min_context".to_string());
    }
    None
}

fn build_user_message(context_chunks: &[ScoredHit], question: &str) -> String {
    if context_chunks.is_empty() {
        format!("[Question]\n{question}")
    } else {
        let context: String = context_chunks
            .iter()
            .map(|c| c.hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("[Context]\n{context}\n[Question]\n{question}")
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[allow(clippy::too_many_arguments)]
fn build_response(
    question: &str,
    answer: String,
    scored: &[ScoredHit],
    context_chunks: &[ScoredHit],
    mode: Mode,
    reason: Option<String>,
    view: &str,
    effective_query: String,
    short_query_active: bool,
    max_similarity: f32,
    threshold_low: f32,
    threshold_high: f32,
    used_llm: bool,
    ctx: &AnswerContext,
) -> Response {
    let used_chunk_ids: std::collections::HashSet<&str> =
        context_chunks.iter().map(|c| c.hit.chunk.chunk_id.as_str()).collect();

    let retrieved_chunks_metadata: Vec<RetrievedChunkMetadata> = scored
        .iter()
        .map(|s| RetrievedChunkMetadata {
            chunk_id: s.hit.chunk.chunk_id.clone(),
            doc_id: s.hit.chunk.doc_id.clone(),
            source: s.hit.chunk.source.clone(),
            chunk_type: s.hit.chunk.kind.label().to_string(),
            raw_score: s.hit.raw_score,
            similarity: s.similarity,
            text_preview: truncate_chars(&s.hit.chunk.text, PREVIEW_CHARS),
        })
        .collect();

    let used_chunks: Vec<UsedChunk> = context_chunks
        .iter()
        .map(|s| UsedChunk {
            chunk_id: s.hit.chunk.chunk_id.clone(),
            source: s.hit.chunk.source.clone(),
            score: s.similarity,
            snippet: truncate_chars(&s.hit.chunk.text, SNIPPET_CHARS),
        })
        .collect();

    let eligible_count = scored
        .iter()
        .filter(|s| !ctx.config.hybrid.exclude_chunk_types_from_llm.contains(&s.hit.chunk.kind.label().to_string()))
        .count();
    let sources_used = if used_chunks.is_empty() {
        SourcesUsed::None
    } else if used_chunk_ids.len() >= eligible_count {
        SourcesUsed::All
    } else {
        SourcesUsed::Partial
    };

    let decision_explain = DecisionExplain {
        score_mode: match ctx.config.score_mode {
            ScoreMode::Normalized => "normalized".to_string(),
            ScoreMode::Raw => "raw".to_string(),
        },
        distance: match ctx.config.distance {
            Distance::DotProduct => "dot_product".to_string(),
            Distance::Cosine => "cosine".to_string(),
        },
        max_similarity,
        threshold_low,
        threshold_high,
        top_k: ctx.config.top_k,
        short_query_active,
        mode,
        effective_query,
        used_llm,
        retrieval_target: view.to_string(),
        reason,
    };

    Response {
        question: question.to_string(),
        answer,
        answer2: None,
        answer3: None,
        retrieved_chunks_metadata,
        used_chunks,
        mode,
        sources_used,
        decision_explain,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_openai::{config::OpenAIConfig, Client};
    use common::storage::types::chunk::{Chunk, ChunkHit, ChunkKind, ChunkMetadata};
    use common::storage::{db::SurrealDbClient, vector_store::VectorStore};
    use common::utils::embedding::Embedder;
    use uuid::Uuid;

    use super::*;
    use crate::LlmClient;

    #[test]
    fn counts_alphabetic_tokens_ignoring_punctuation() {
        assert_eq!(count_alphabetic_tokens("modem?"), 1);
        assert_eq!(count_alphabetic_tokens("how do I reset the modem"), 6);
    }

    #[test]
    fn short_query_boundary_is_inclusive() {
        // max_tokens defaults to 2 (ShortQueryConfig::default); exactly 2
        // alphabetic tokens is still short-query, 3 is not.
        let cfg = common::config::retrieval_config::ShortQueryConfig::default();
        assert!(count_alphabetic_tokens("reset modem") <= cfg.max_tokens);
        assert!(count_alphabetic_tokens("reset my modem") > cfg.max_tokens);
    }

    #[test]
    fn truncates_to_char_budget() {
        let text = "x".repeat(400);
        assert_eq!(truncate_chars(&text, SNIPPET_CHARS).len(), SNIPPET_CHARS);
    }

    fn figure_kind() -> ChunkKind {
        ChunkKind::Figure {
            figure_id: "fig1".to_string(),
            image_ref: "fig1.png".to_string(),
            parent_chunk_id: "c0".to_string(),
            parent_chunk_local_index: 0,
        }
    }

    fn chunk_hit(id: &str, doc_id: &str, kind: ChunkKind, text: &str, similarity: f32) -> ScoredHit {
        ScoredHit {
            hit: ChunkHit {
                chunk: Chunk {
                    chunk_id: id.to_string(),
                    doc_id: doc_id.to_string(),
                    text: text.to_string(),
                    source: format!("{doc_id}.pdf"),
                    embedding: vec![],
                    hash_norm: format!("hash_{id}"),
                    kind,
                    metadata: ChunkMetadata::default(),
                },
                raw_score: similarity,
            },
            similarity,
        }
    }

    async fn memory_db() -> std::sync::Arc<SurrealDbClient> {
        std::sync::Arc::new(SurrealDbClient::memory("test_ns", &Uuid::new_v4().to_string()).await.unwrap())
    }

    async fn test_ctx() -> AnswerContext {
        let store = VectorStore::new(memory_db().await);
        let unreachable = OpenAIConfig::new().with_api_key("test").with_api_base("http://127.0.0.1:0");
        AnswerContext {
            vector_store: store,
            embedder: Embedder::new(Client::with_config(unreachable.clone()), "text-embedding-3-small", 3, 16, 3000),
            llm_primary: LlmClient::new(Client::with_config(unreachable.clone()), "gpt-4o-mini"),
            llm_fallback: LlmClient::new(Client::with_config(unreachable), "gpt-4o-mini"),
            config: test_config(),
            default_alias: "demo".to_string(),
            domains: HashMap::new(),
        }
    }

    fn test_config() -> common::config::retrieval_config::RetrievalConfig {
        common::config::retrieval_config::RetrievalConfig {
            top_k: 12,
            distance: Distance::DotProduct,
            score_mode: ScoreMode::Normalized,
            threshold_low: 0.2,
            threshold_high: 0.45,
            raw_threshold_low: None,
            raw_threshold_high: None,
            short_query: Default::default(),
            hybrid: Default::default(),
            prompts: Default::default(),
        }
    }

    #[tokio::test]
    async fn assemble_context_excludes_configured_chunk_types() {
        let mut ctx = test_ctx().await;
        ctx.config.hybrid.min_tokens_per_chunk = 5;
        let scored = vec![
            chunk_hit("c1", "doc1", ChunkKind::Text, "plenty of words in this chunk of real text", 0.9),
            chunk_hit(
                "c2",
                "doc2",
                figure_kind(),
                "a figure chunk with enough words to pass the length gate",
                0.9,
            ),
        ];

        let selected = assemble_context(&ctx, &scored);
        assert!(selected.iter().all(|s| s.hit.chunk.kind.label() != "figure"));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].hit.chunk.chunk_id, "c1");
    }

    #[tokio::test]
    async fn assemble_context_drops_short_chunks() {
        let mut ctx = test_ctx().await;
        ctx.config.hybrid.min_tokens_per_chunk = 20;
        let scored = vec![chunk_hit("c1", "doc1", ChunkKind::Text, "too short", 0.9)];

        assert!(assemble_context(&ctx, &scored).is_empty());
    }

    #[tokio::test]
    async fn assemble_context_respects_max_chunks_budget() {
        let mut ctx = test_ctx().await;
        ctx.config.hybrid.max_chunks = 1;
        let long_text = "word ".repeat(30);
        let scored = vec![
            chunk_hit("c1", "doc1", ChunkKind::Text, &long_text, 0.9),
            chunk_hit("c2", "doc2", ChunkKind::Text, &long_text, 0.8),
        ];

        assert_eq!(assemble_context(&ctx, &scored).len(), 1);
    }

    #[tokio::test]
    async fn hybrid_gate_fails_on_low_similarity() {
        let mut ctx = test_ctx().await;
        ctx.config.hybrid.min_similarity_for_hybrid = 0.5;
        assert_eq!(
            check_hybrid_gates(&ctx, 0.3, &[]),
            Some("gate_failed_min_similarity".to_string())
        );
    }

    #[tokio::test]
    async fn hybrid_gate_fails_on_min_chunks() {
        let mut ctx = test_ctx().await;
        ctx.config.hybrid.min_similarity_for_hybrid = 0.0;
        ctx.config.hybrid.min_chunks_for_hybrid = 3;
        let long_text = "word ".repeat(30);
        let scored = vec![chunk_hit("c1", "doc1", ChunkKind::Text, &long_text, 0.9)];

        assert_eq!(
            check_hybrid_gates(&ctx, 0.9, &scored),
            Some("gate_failed_min_chunks".to_string())
        );
    }

    #[tokio::test]
    async fn hybrid_gate_fails_on_min_total_context_chars() {
        let mut ctx = test_ctx().await;
        ctx.config.hybrid.min_similarity_for_hybrid = 0.0;
        ctx.config.hybrid.min_chunks_for_hybrid = 0;
        ctx.config.hybrid.min_total_context_chars = 10_000;
        let scored = vec![chunk_hit("c1", "doc1", ChunkKind::Text, "short context", 0.9)];

        assert_eq!(
            check_hybrid_gates(&ctx, 0.9, &scored),
            Some("gate_failed_min_context".to_string())
        );
    }

    #[tokio::test]
    async fn hybrid_gate_passes_when_all_thresholds_clear() {
        let mut ctx = test_ctx().await;
        ctx.config.hybrid.min_similarity_for_hybrid = 0.0;
        ctx.config.hybrid.min_chunks_for_hybrid = 0;
        ctx.config.hybrid.min_total_context_chars = 0;

        assert_eq!(check_hybrid_gates(&ctx, 0.9, &[]), None);
    }
}
