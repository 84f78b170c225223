use common::{config::profile::ChunkerParams, error::AppError, storage::types::chunk::Chunk};
use text_splitter::{ChunkConfig, TextSplitter};
use tokenizers::Tokenizer;

use crate::{char_strategy::build_chunk, item::Item};

/// Token strategy (spec.md §4.2): split by approximate token count
/// (`max_tokens`) with fractional `overlap`. Implemented for real per
/// SPEC_FULL.md §14 Open Question #2 — a profile declaring this strategy
/// without a resolvable tokenizer is rejected as `unknown_profile` at
/// startup (`Profile::validate`), never silently downgraded to char
/// chunking.
pub fn chunk(doc_id: &str, items: &[Item], params: &ChunkerParams) -> Result<Vec<Chunk>, AppError> {
    let tokenizer_path = params.tokenizer.as_ref().ok_or_else(|| {
        AppError::InvariantViolated(
            "token chunker invoked without a resolved tokenizer".to_string(),
        )
    })?;

    let tokenizer = Tokenizer::from_file(tokenizer_path)
        .map_err(|e| AppError::InvariantViolated(format!("failed to load tokenizer: {e}")))?;

    let overlap_tokens = ((params.max_tokens as f32) * params.overlap_ratio).round() as usize;
    let config = ChunkConfig::new(params.max_tokens)
        .with_overlap(overlap_tokens)
        .map_err(|e| AppError::InvariantViolated(format!("invalid chunker window: {e}")))?
        .with_sizer(tokenizer);
    let splitter = TextSplitter::new(config);

    let mut out = Vec::new();
    let mut index = 0usize;

    for item in items {
        for piece in splitter.chunks(&item.text) {
            if piece.trim().is_empty() {
                continue;
            }
            out.push(build_chunk(doc_id, index, piece, item));
            index += 1;
        }
    }

    Ok(out)
}
