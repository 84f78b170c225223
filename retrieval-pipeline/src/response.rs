use serde::Serialize;

/// Retrieval mode actually taken for a request (spec.md §4.6 step 6/10).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Rag,
    Hybrid,
    Fallback,
}

/// Whether the prompted context actually covered the retrieved candidates
/// (spec.md §4.6 step 11 `sources_used`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcesUsed {
    All,
    Partial,
    None,
}

/// One chunk that was actually included in the prompt sent to the LLM
/// (spec.md §4.6 step 11 `used_chunks`).
#[derive(Clone, Debug, Serialize)]
pub struct UsedChunk {
    pub chunk_id: String,
    pub source: String,
    pub score: f32,
    /// Truncated to at most 300 characters (spec.md §4.6 step 11).
    pub snippet: String,
}

/// Every row returned by the similarity search, independent of whether it
/// ended up in the prompt — figure chunks excluded from context still
/// appear here (spec.md §4.6 step 11 `retrieved_chunks_metadata`, scenario S4).
#[derive(Clone, Debug, Serialize)]
pub struct RetrievedChunkMetadata {
    pub chunk_id: String,
    pub doc_id: String,
    pub source: String,
    pub chunk_type: String,
    pub raw_score: f32,
    pub similarity: f32,
    pub text_preview: String,
}

/// Diagnostic explanation of how the mode decision was reached (spec.md
/// §4.6 step 11 `decision_explain`).
#[derive(Clone, Debug, Serialize)]
pub struct DecisionExplain {
    pub score_mode: String,
    pub distance: String,
    pub max_similarity: f32,
    pub threshold_low: f32,
    pub threshold_high: f32,
    pub top_k: usize,
    pub short_query_active: bool,
    pub mode: Mode,
    pub effective_query: String,
    pub used_llm: bool,
    pub retrieval_target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Full `/chat` response body (spec.md §6.1, §4.6 step 11). `answer2`/
/// `answer3` are wire-compatibility fields the teacher's clients still
/// read; this service never populates them (Open Question #1, SPEC_FULL.md
/// §14).
#[derive(Clone, Debug, Serialize)]
pub struct Response {
    pub question: String,
    pub answer: String,
    pub answer2: Option<String>,
    pub answer3: Option<String>,
    pub retrieved_chunks_metadata: Vec<RetrievedChunkMetadata>,
    pub used_chunks: Vec<UsedChunk>,
    pub mode: Mode,
    pub sources_used: SourcesUsed,
    pub decision_explain: DecisionExplain,
}
