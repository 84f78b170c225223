pub mod audit;
pub mod pack_cache;
pub mod sanitizer;
pub mod validator;

pub use sanitizer::{Sanitizer, SanitizerMode};

use std::collections::BTreeMap;

/// Result of `Sanitizer::sanitize` (spec.md §4.1 contract:
/// `sanitize(text, doc_id) → (processed_text, counters{label → count})`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SanitizeOutcome {
    pub processed_text: String,
    pub counters: BTreeMap<String, u32>,
}

impl SanitizeOutcome {
    pub fn total_redactions(&self) -> u32 {
        self.counters.values().sum()
    }
}
