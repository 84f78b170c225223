pub mod admin_filter;
pub mod char_strategy;
pub mod item;
pub mod structured;
pub mod token_strategy;

use common::{
    config::profile::{ChunkerKind, Profile},
    error::AppError,
    storage::types::chunk::Chunk,
};
use item::Item;

/// Dispatches to the strategy named by `profile.chunker_kind` (spec.md
/// §4.2). Each strategy receives the same ordered `items` a document loader
/// produced and returns an ordered list of `Chunk`s with monotonic,
/// zero-padded `chunk_id`s.
pub fn chunk(doc_id: &str, items: &[Item], profile: &Profile) -> Result<Vec<Chunk>, AppError> {
    match profile.chunker_kind {
        ChunkerKind::Char => char_strategy::chunk(doc_id, items, &profile.chunker),
        ChunkerKind::Token => token_strategy::chunk(doc_id, items, &profile.chunker),
        ChunkerKind::Structured => structured::chunk(doc_id, items, &profile.chunker, false),
        ChunkerKind::TocSection => structured::chunk(doc_id, items, &profile.chunker, true),
    }
}
