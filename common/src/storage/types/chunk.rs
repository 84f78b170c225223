use serde::{Deserialize, Serialize};

/// Tagged variant for `chunk_type` (spec.md §9 "Polymorphic chunk
/// metadata"): non-applicable fields are absent rather than null-populated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "chunk_type")]
pub enum ChunkKind {
    Text,
    Figure {
        figure_id: String,
        image_ref: String,
        parent_chunk_id: String,
        parent_chunk_local_index: usize,
    },
}

impl ChunkKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChunkKind::Text => "text",
            ChunkKind::Figure { .. } => "figure",
        }
    }
}

/// Optional metadata carried alongside a chunk (spec.md §3 `Chunk`).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub block_type: Option<String>,
    #[serde(default)]
    pub section_path: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub slide_number: Option<u32>,
    #[serde(default)]
    pub sheet_name: Option<String>,
}

/// Ordered unit of indexed content (spec.md §3 `Chunk`). Written once into a
/// physical table; immutable thereafter — there is no update path, only
/// insert (via `VectorStore::upsert`) and whole-table drop.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub doc_id: String,
    pub text: String,
    pub source: String,
    pub embedding: Vec<f32>,
    pub hash_norm: String,
    #[serde(flatten)]
    pub kind: ChunkKind,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// `"<doc_id>_chunk_<N>"`, zero-padded monotonic `N` within the
    /// document (spec.md §4.2 invariant). Figure chunk ids additionally
    /// incorporate `figure_id` by the caller appending it after this base.
    pub fn chunk_id_for(doc_id: &str, index: usize) -> String {
        format!("{doc_id}_chunk_{index:05}")
    }
}

/// A hit returned from `VectorStore::similarity_search` (spec.md §4.4):
/// the chunk plus its raw, store-native distance/similarity value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkHit {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub raw_score: f32,
}
