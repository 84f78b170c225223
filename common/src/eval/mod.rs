use serde::{Deserialize, Serialize};

use crate::storage::types::chunk::ChunkHit;

/// One golden query (spec.md §4.5 step 8): a question paired with the
/// `doc_id`s a correct retrieval is expected to surface, plus an optional
/// phrase that should appear verbatim somewhere in the retrieved text.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GoldenQuery {
    pub question: String,
    pub expected_doc_ids: Vec<String>,
    pub expected_phrase: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct EvalSummary {
    pub hit_rate: f32,
    pub mrr: f32,
    pub phrase_hit_rate: f32,
}

/// Per-query outcome: whether any expected `doc_id` appeared in the top-k,
/// the reciprocal rank of the first expected hit, and whether the expected
/// phrase (if any) appeared in any retrieved chunk's text.
struct QueryOutcome {
    hit: bool,
    reciprocal_rank: f32,
    phrase_hit: Option<bool>,
}

fn score_query(query: &GoldenQuery, hits: &[ChunkHit]) -> QueryOutcome {
    let mut reciprocal_rank = 0.0;
    let mut hit = false;

    for (rank, candidate) in hits.iter().enumerate() {
        if query.expected_doc_ids.contains(&candidate.chunk.doc_id) {
            hit = true;
            if reciprocal_rank == 0.0 {
                reciprocal_rank = 1.0 / (rank as f32 + 1.0);
            }
        }
    }

    let phrase_hit = query.expected_phrase.as_ref().map(|phrase| {
        let needle = phrase.to_lowercase();
        hits.iter()
            .any(|h| h.chunk.text.to_lowercase().contains(&needle))
    });

    QueryOutcome {
        hit,
        reciprocal_rank,
        phrase_hit,
    }
}

/// Aggregates `hit@k` / MRR / phrase-hit-rate across a golden-query set
/// against already-retrieved results (one `Vec<ChunkHit>` per query, same
/// order as `queries`). Retrieval itself is the caller's concern (run
/// against the just-written physical table per spec.md §4.5 step 8).
pub fn summarize(queries: &[GoldenQuery], results: &[Vec<ChunkHit>]) -> EvalSummary {
    if queries.is_empty() {
        return EvalSummary::default();
    }

    let mut hits = 0usize;
    let mut reciprocal_rank_sum = 0.0f32;
    let mut phrase_hits = 0usize;
    let mut phrase_queries = 0usize;

    for (query, hits_for_query) in queries.iter().zip(results) {
        let outcome = score_query(query, hits_for_query);
        if outcome.hit {
            hits += 1;
        }
        reciprocal_rank_sum += outcome.reciprocal_rank;
        if let Some(phrase_hit) = outcome.phrase_hit {
            phrase_queries += 1;
            if phrase_hit {
                phrase_hits += 1;
            }
        }
    }

    let n = queries.len() as f32;
    EvalSummary {
        hit_rate: hits as f32 / n,
        mrr: reciprocal_rank_sum / n,
        phrase_hit_rate: if phrase_queries == 0 {
            1.0
        } else {
            phrase_hits as f32 / phrase_queries as f32
        },
    }
}
