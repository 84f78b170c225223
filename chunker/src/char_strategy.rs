use common::{config::profile::ChunkerParams, error::AppError, storage::types::chunk::{Chunk, ChunkKind, ChunkMetadata}};
use sha2::{Digest, Sha256};
use text_splitter::{ChunkConfig, TextSplitter};

use crate::item::Item;

/// Char strategy (spec.md §4.2): windows of `size` characters with
/// `overlap` characters of carried-forward context, breaking on configured
/// separators when possible. Built on the `text-splitter` crate's
/// recursive boundary-aware splitter rather than a naive fixed-width slice,
/// so breaks prefer paragraph/sentence boundaries within the window.
pub fn chunk(doc_id: &str, items: &[Item], params: &ChunkerParams) -> Result<Vec<Chunk>, AppError> {
    let config = ChunkConfig::new(params.size)
        .with_overlap(params.overlap)
        .map_err(|e| AppError::InvariantViolated(format!("invalid chunker window: {e}")))?;
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

pub(crate) fn build_chunk(doc_id: &str, index: usize, text: &str, item: &Item) -> Chunk {
    Chunk {
        chunk_id: Chunk::chunk_id_for(doc_id, index),
        doc_id: doc_id.to_string(),
        text: text.to_string(),
        source: doc_id.to_string(),
        embedding: Vec::new(),
        hash_norm: hash_norm(text),
        kind: ChunkKind::Text,
        metadata: ChunkMetadata {
            page: item.page,
            slide_number: item.slide_number,
            sheet_name: item.sheet_name.clone(),
            block_type: item.block_type.clone(),
            section_path: item.heading.clone(),
            ..Default::default()
        },
    }
}

/// Lowercase/whitespace-normalised SHA-256 of the chunk text, used for
/// dedupe (spec.md §3 `Chunk.hash_norm`).
pub fn hash_norm(text: &str) -> String {
    let normalized: String = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str) -> Item {
        Item {
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn produces_monotonic_zero_padded_chunk_ids() {
        let items = vec![item("First paragraph. Second paragraph. Third paragraph.")];
        let params = ChunkerParams {
            size: 20,
            overlap: 5,
            ..Default::default()
        };
        let chunks = chunk("doc1", &items, &params).unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].chunk_id, "doc1_chunk_00000");
        assert_eq!(chunks[1].chunk_id, "doc1_chunk_00001");
    }

    #[test]
    fn hash_norm_is_case_and_whitespace_insensitive() {
        assert_eq!(hash_norm("Hello   World"), hash_norm("hello world"));
    }
}
