use common::config::retrieval_config::{Distance, ScoreMode};
use common::storage::types::chunk::ChunkHit;

/// Clamp a value into `[0, 1]`.
pub const fn clamp_unit(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Maps a store-native `raw_score` onto `similarity ∈ [0, 1]` (spec.md §4.6
/// step 4). `ScoreMode::Raw` leaves the value untouched — callers must then
/// compare against the profile's raw thresholds rather than the normalised
/// ones. `ScoreMode::Normalized` applies the distance-specific transform:
/// dot product assumes unit-normalised vectors (`raw ∈ [-1, 1]`) so
/// `(raw + 1) / 2`; cosine distance (`0` = identical) maps via `1 - raw`.
pub fn to_similarity(raw: f32, distance: Distance, score_mode: ScoreMode) -> f32 {
    match score_mode {
        ScoreMode::Raw => raw,
        ScoreMode::Normalized => match distance {
            Distance::DotProduct => clamp_unit((raw + 1.0) / 2.0),
            Distance::Cosine => clamp_unit(1.0 - raw),
        },
    }
}

/// A retrieved row enriched with its normalised similarity (spec.md §4.6
/// step 4 output, carried through steps 6-11).
#[derive(Clone, Debug)]
pub struct ScoredHit {
    pub hit: ChunkHit,
    pub similarity: f32,
}

/// Sorts by similarity descending, then dedupes by the configured key
/// (spec.md §4.6 step 7 "dedupe_by", default `doc_id`) keeping the
/// highest-similarity row per key. `per_doc_cap` additionally bounds how
/// many chunks from the same key may survive, approximating MMR diversity
/// without a second embedding-distance pass.
pub fn sort_and_dedupe(mut hits: Vec<ScoredHit>, dedupe_by: DedupeKey, per_doc_cap: Option<usize>) -> Vec<ScoredHit> {
    hits.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut seen_keys: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut per_key_count: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut out = Vec::with_capacity(hits.len());

    for scored in hits {
        let key = dedupe_by.key_of(&scored.hit);
        let cap_ok = match per_doc_cap {
            Some(cap) => *per_key_count.get(&key).unwrap_or(&0) < cap,
            None => !seen_keys.contains(&key),
        };
        if !cap_ok {
            continue;
        }
        seen_keys.insert(key.clone());
        *per_key_count.entry(key).or_insert(0) += 1;
        out.push(scored);
    }

    out
}

/// `dedupe_by` key selector named in spec.md §4.6 step 7 (default `doc_id`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DedupeKey {
    #[default]
    DocId,
    ChunkId,
}

impl DedupeKey {
    fn key_of(self, hit: &ChunkHit) -> String {
        match self {
            DedupeKey::DocId => hit.chunk.doc_id.clone(),
            DedupeKey::ChunkId => hit.chunk.chunk_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_product_normalized_maps_into_unit_range() {
        let similarity = to_similarity(0.62, Distance::DotProduct, ScoreMode::Normalized);
        assert!((similarity - 0.81).abs() < 1e-6);
    }

    #[test]
    fn cosine_normalized_clamps_negative_distance_to_one() {
        let similarity = to_similarity(-0.2, Distance::Cosine, ScoreMode::Normalized);
        assert_eq!(similarity, 1.0);
    }

    #[test]
    fn raw_mode_passes_value_through_unchanged() {
        let similarity = to_similarity(0.62, Distance::DotProduct, ScoreMode::Raw);
        assert_eq!(similarity, 0.62);
    }
}
