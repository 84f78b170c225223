use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::Arc,
};

use common::{config::sanitizer_pack::SanitizerPack, error::AppError};
use regex::Regex;
use tokio::sync::{Mutex, OnceCell};

#[derive(Debug)]
pub struct CompiledRule {
    pub label: String,
    pub patterns: Vec<Regex>,
    pub validator: Option<common::config::sanitizer_pack::Validator>,
}

/// A pack with its patterns pre-compiled, ready for repeated use across
/// documents (spec.md §4.1 step 1: "cache the compiled patterns").
#[derive(Debug)]
pub struct CompiledPack {
    pub rules: Vec<CompiledRule>,
    pub allowlist: HashSet<String>,
    pub placeholder_format: String,
    pub placeholder_format_pseudonym: String,
}

fn compile(pack: SanitizerPack) -> Result<CompiledPack, AppError> {
    let mut rules = Vec::with_capacity(pack.pii.len());
    for (label, rule) in pack.pii {
        let patterns = rule
            .pattern
            .patterns()
            .into_iter()
            .map(Regex::new)
            .collect::<Result<Vec<_>, _>>()?;
        rules.push(CompiledRule {
            label,
            patterns,
            validator: rule.validator,
        });
    }

    Ok(CompiledPack {
        rules,
        allowlist: pack.allowlist.tokens.into_iter().collect(),
        placeholder_format: pack.placeholder.format,
        placeholder_format_pseudonym: pack.placeholder.format_pseudonym,
    })
}

/// Process-wide, read-mostly cache keyed by `(config_dir, profile)`, guarded
/// by a single-flight pattern so concurrent first-loads compile the pack
/// exactly once (spec.md §5).
#[derive(Clone, Default)]
pub struct PackCache {
    entries: Arc<Mutex<HashMap<(String, String), Arc<OnceCell<Arc<CompiledPack>>>>>>,
}

impl PackCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_load(
        &self,
        config_dir: &str,
        profile: &str,
    ) -> Result<Arc<CompiledPack>, AppError> {
        let key = (config_dir.to_string(), profile.to_string());
        let cell = {
            let mut entries = self.entries.lock().await;
            entries.entry(key).or_insert_with(|| Arc::new(OnceCell::new())).clone()
        };

        cell.get_or_try_init(|| async {
            let path = Path::new(config_dir).join(format!("{profile}.json"));
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(AppError::Io)?;
            let pack: SanitizerPack = serde_json::from_str(&raw)
                .map_err(|e| AppError::InvariantViolated(format!("malformed sanitizer pack {path:?}: {e}")))?;
            compile(pack).map(Arc::new)
        })
        .await
        .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_pack(dir: &tempfile::TempDir, profile: &str, body: &str) {
        let path = dir.path().join(format!("{profile}.json"));
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn loads_and_caches_pack() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(
            &dir,
            "default",
            r#"{"pii": {"EMAIL": {"pattern": "[\\w.]+@[\\w.]+"}}, "allowlist": {"tokens": []}, "placeholder": {"format": "[{TYPE}]", "format_pseudonym": "[{TYPE}:{HASH}]"}}"#,
        );

        let cache = PackCache::new();
        let first = cache
            .get_or_load(dir.path().to_str().unwrap(), "default")
            .await
            .unwrap();
        let second = cache
            .get_or_load(dir.path().to_str().unwrap(), "default")
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.rules.len(), 1);
    }

    #[tokio::test]
    async fn invalid_regex_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(
            &dir,
            "broken",
            r#"{"pii": {"EMAIL": {"pattern": "("}}, "allowlist": {"tokens": []}, "placeholder": {"format": "[{TYPE}]", "format_pseudonym": "[{TYPE}:{HASH}]"}}"#,
        );

        let cache = PackCache::new();
        let result = cache
            .get_or_load(dir.path().to_str().unwrap(), "broken")
            .await;
        assert!(result.is_err());
    }
}
