use serde::Deserialize;

use super::retrieval_config::Distance;

/// Chunking strategy selected by a profile (spec.md §4.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkerKind {
    Char,
    Token,
    Structured,
    TocSection,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChunkerParams {
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
    #[serde(default)]
    pub separators: Vec<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_overlap_ratio")]
    pub overlap_ratio: f32,
    /// Tokenizer file/identifier for `ChunkerKind::Token`. Required when
    /// `kind == Token` — a profile missing this fails fast at startup with
    /// `unknown_profile` rather than silently falling back to char chunking
    /// (Open Question #2, SPEC_FULL.md §14).
    #[serde(default)]
    pub tokenizer: Option<String>,
    #[serde(default)]
    pub admin_sections: AdminSectionFilter,
}

fn default_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    150
}
fn default_max_tokens() -> usize {
    400
}
fn default_overlap_ratio() -> f32 {
    0.15
}

impl Default for ChunkerParams {
    fn default() -> Self {
        Self {
            size: default_size(),
            overlap: default_overlap(),
            separators: vec!["\n\n".into(), "\n".into(), ". ".into()],
            max_tokens: default_max_tokens(),
            overlap_ratio: default_overlap_ratio(),
            tokenizer: None,
            admin_sections: AdminSectionFilter::default(),
        }
    }
}

/// Admin-section filter for the structured/TOC-section strategies
/// (spec.md §4.2 "Admin-section filter").
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AdminSectionFilter {
    #[serde(default)]
    pub heading_regex: Vec<String>,
    #[serde(default)]
    pub stop_excluding_after_heading_regex: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BatchingConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_min: u32,
}

fn default_batch_size() -> usize {
    64
}
fn default_rate_limit() -> u32 {
    3000
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            rate_limit_per_min: default_rate_limit(),
        }
    }
}

/// Metadata keep-list: which optional chunk metadata fields this profile
/// carries through to the physical index (spec.md §3 `Profile`).
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MetadataKeepList {
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Named ingestion configuration bundle (spec.md §3 `Profile`).
#[derive(Clone, Debug, Deserialize)]
pub struct Profile {
    pub name: String,
    pub chunker_kind: ChunkerKind,
    #[serde(default)]
    pub chunker: ChunkerParams,
    pub distance: Distance,
    #[serde(default)]
    pub metadata_keep_list: MetadataKeepList,
    #[serde(default)]
    pub batching: BatchingConfig,
    #[serde(default = "default_true")]
    pub dedupe_by_hash: bool,
    pub index_name: String,
    pub alias_name: String,
    #[serde(default)]
    pub ocr: bool,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    /// Golden-query JSONL path for the step-8 evaluation gate (spec.md §4.5
    /// step 8/9). Absent means `evaluate=true` runs as a no-op: the job
    /// collects no summary and nothing blocks alias rotation (Open Question,
    /// SPEC_FULL.md §14 — the spec names the gate but not where the golden
    /// set lives).
    #[serde(default)]
    pub eval_queries_path: Option<String>,
    /// Minimum `hit_rate` required for `update_alias=true` to proceed after
    /// evaluation. `None` means evaluation is informational only.
    #[serde(default)]
    pub eval_min_hit_rate: Option<f32>,
}

fn default_true() -> bool {
    true
}

impl Profile {
    /// Validates the profile once at startup, per SPEC_FULL.md §14 Open
    /// Question #2: a `token` chunker without a resolvable tokenizer is
    /// rejected rather than silently degraded to `char`.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunker_kind == ChunkerKind::Token && self.chunker.tokenizer.is_none() {
            return Err(format!(
                "profile '{}' declares a token chunker but no tokenizer",
                self.name
            ));
        }
        Ok(())
    }
}
