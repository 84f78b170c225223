use serde::Deserialize;

/// Optional routing override selected by `X-RAG-Domain` at retrieval time
/// and by `options.domain_key` at ingest time (spec.md §3 `Domain`).
#[derive(Clone, Debug, Deserialize)]
pub struct Domain {
    pub index_name: String,
    pub alias_name: String,
}
