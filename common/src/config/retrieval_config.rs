use serde::Deserialize;

/// Distance metric a profile's physical index was built with (spec.md §3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distance {
    DotProduct,
    Cosine,
}

/// Whether retrieval scores are interpreted as a normalised `[0,1]`
/// similarity or left as the store's raw metric value (spec.md §4.6 step 4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    Normalized,
    Raw,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ShortQueryConfig {
    pub max_tokens: usize,
    pub threshold_low: f32,
    pub threshold_high: f32,
}

impl Default for ShortQueryConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2,
            threshold_low: 0.3,
            threshold_high: 0.95,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct HybridGates {
    pub max_context_chars: usize,
    pub max_chunks: usize,
    pub min_tokens_per_chunk: usize,
    pub min_similarity_for_hybrid: f32,
    pub min_chunks_for_hybrid: usize,
    pub min_total_context_chars: usize,
    #[serde(default = "default_excluded_chunk_types")]
    pub exclude_chunk_types_from_llm: Vec<String>,
}

fn default_excluded_chunk_types() -> Vec<String> {
    vec!["figure".to_string()]
}

impl Default for HybridGates {
    fn default() -> Self {
        Self {
            max_context_chars: 8000,
            max_chunks: 8,
            min_tokens_per_chunk: 20,
            min_similarity_for_hybrid: 0.25,
            min_chunks_for_hybrid: 2,
            min_total_context_chars: 200,
            exclude_chunk_types_from_llm: default_excluded_chunk_types(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct PromptsConfig {
    pub rag: String,
    pub hybrid: String,
    pub fallback: String,
    pub no_context_token: String,
    pub max_output_tokens: u32,
    /// `L-primary` chat model (spec.md §2 component list, §4.6 step 9). Not
    /// enumerated in spec.md §6.6's Retrieval config-key list alongside the
    /// thresholds/prompts it names — resolved (SPEC_FULL.md §14) by keeping
    /// it here next to the prompt text it pairs with, rather than inventing
    /// a separate top-level config section for two model names.
    #[serde(default = "default_model_primary")]
    pub model_primary: String,
    /// `L-fallback` chat model (spec.md GLOSSARY "Fallback ... uses a
    /// dedicated prompt and model"). Defaults to the same model as
    /// `model_primary`; set distinctly to run the no-context retry on a
    /// cheaper/steadier model.
    #[serde(default = "default_model_fallback")]
    pub model_fallback: String,
}

fn default_model_primary() -> String {
    "gpt-4o-mini".to_string()
}

fn default_model_fallback() -> String {
    default_model_primary()
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            rag: "You are a helpful assistant. Answer using only the provided context."
                .to_string(),
            hybrid: "You are a helpful assistant. The context below may be incomplete; answer carefully and say so if unsure."
                .to_string(),
            fallback: "You are a helpful assistant. No reliable context was found; answer from general knowledge or say you don't know."
                .to_string(),
            no_context_token: "NO_CONTEXT".to_string(),
            max_output_tokens: 512,
            model_primary: default_model_primary(),
            model_fallback: default_model_fallback(),
        }
    }
}

/// Per-request retrieval configuration (spec.md §3 `RetrievalConfig`).
#[derive(Clone, Debug, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub distance: Distance,
    pub score_mode: ScoreMode,
    pub threshold_low: f32,
    pub threshold_high: f32,
    #[serde(default)]
    pub raw_threshold_low: Option<f32>,
    #[serde(default)]
    pub raw_threshold_high: Option<f32>,
    #[serde(default)]
    pub short_query: ShortQueryConfig,
    #[serde(default)]
    pub hybrid: HybridGates,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 12,
            distance: Distance::DotProduct,
            score_mode: ScoreMode::Normalized,
            threshold_low: 0.2,
            threshold_high: 0.45,
            raw_threshold_low: None,
            raw_threshold_high: None,
            short_query: ShortQueryConfig::default(),
            hybrid: HybridGates::default(),
            prompts: PromptsConfig::default(),
        }
    }
}

impl RetrievalConfig {
    /// Active threshold pair, switching to the short-query pair when
    /// `short_query_active` (spec.md §4.6 step 5). Under `ScoreMode::Raw`
    /// the short-query pair is still normalised-scale (it has no raw
    /// counterpart), so only the base pair substitutes `raw_threshold_*`
    /// when present.
    pub fn thresholds(&self, short_query_active: bool) -> (f32, f32) {
        if short_query_active {
            (self.short_query.threshold_low, self.short_query.threshold_high)
        } else if self.score_mode == ScoreMode::Raw {
            (
                self.raw_threshold_low.unwrap_or(self.threshold_low),
                self.raw_threshold_high.unwrap_or(self.threshold_high),
            )
        } else {
            (self.threshold_low, self.threshold_high)
        }
    }
}
