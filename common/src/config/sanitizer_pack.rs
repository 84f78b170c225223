use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// On-disk pattern-pack format (spec.md §6.4). Deserialised directly from
/// the pack JSON file; the `sanitizer` crate compiles `pattern`/`patterns`
/// into `regex::Regex` and caches the result per `(path, profile)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SanitizerPack {
    pub pii: HashMap<String, PiiRule>,
    #[serde(default)]
    pub allowlist: Allowlist,
    pub placeholder: PlaceholderFormat,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    Single(String),
    Many(Vec<String>),
}

impl PatternSpec {
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            PatternSpec::Single(p) => vec![p.as_str()],
            PatternSpec::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PiiRule {
    #[serde(alias = "pattern", alias = "patterns")]
    pub pattern: PatternSpec,
    #[serde(default)]
    pub group_value: Option<GroupSelector>,
    #[serde(default)]
    pub validator: Option<Validator>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSelector {
    Index(usize),
    Name(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validator {
    Luhn,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Allowlist {
    #[serde(default)]
    pub tokens: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaceholderFormat {
    pub format: String,
    pub format_pseudonym: String,
}

impl Default for PlaceholderFormat {
    fn default() -> Self {
        Self {
            format: "[{TYPE}]".to_string(),
            format_pseudonym: "[{TYPE}:{HASH}]".to_string(),
        }
    }
}
