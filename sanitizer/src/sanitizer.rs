use std::collections::BTreeMap;

use common::error::AppError;
use sha2::{Digest, Sha256};
use tracing::warn;

pub use common::utils::config::SanitizerMode;

use crate::{audit, pack_cache::PackCache, validator, SanitizeOutcome};

pub fn mode_label(mode: SanitizerMode) -> &'static str {
    match mode {
        SanitizerMode::Off => "off",
        SanitizerMode::Shadow => "shadow",
        SanitizerMode::On => "on",
    }
}

struct Match {
    label: String,
    start: usize,
    end: usize,
    text: String,
}

/// Stateless text transformer given pattern packs and a runtime mode
/// (spec.md §4.1). Holds only the process-wide pack cache; everything else
/// is passed in per call.
#[derive(Clone, Default)]
pub struct Sanitizer {
    packs: PackCache,
}

impl Sanitizer {
    pub fn new() -> Self {
        Self {
            packs: PackCache::new(),
        }
    }

    /// `sanitize(text, doc_id) → (processed_text, counters{label → count})`.
    /// `config_dir`/`profile` resolve the pack; `mode` selects `off` /
    /// `shadow` / `on`; `hash_salt` seeds pseudonym hashing; when
    /// `audit_enabled`, a line is appended to `audit_path` iff any counter
    /// is non-zero.
    #[allow(clippy::too_many_arguments)]
    pub async fn sanitize(
        &self,
        text: &str,
        doc_id: &str,
        config_dir: &str,
        profile: &str,
        mode: SanitizerMode,
        hash_salt: &str,
        pseudonymise: bool,
        audit_enabled: bool,
        audit_path: &str,
    ) -> Result<SanitizeOutcome, AppError> {
        if matches!(mode, SanitizerMode::Off) {
            return Ok(SanitizeOutcome {
                processed_text: text.to_string(),
                counters: BTreeMap::new(),
            });
        }

        let pack = self.packs.get_or_load(config_dir, profile).await?;

        let mut matches = Vec::new();
        for rule in &pack.rules {
            for pattern in &rule.patterns {
                for m in pattern.find_iter(text) {
                    let candidate = m.as_str();
                    if pack.allowlist.contains(candidate) {
                        continue;
                    }
                    if let Some(validator) = rule.validator {
                        if !validator::passes(validator, candidate) {
                            continue;
                        }
                    }
                    matches.push(Match {
                        label: rule.label.clone(),
                        start: m.start(),
                        end: m.end(),
                        text: candidate.to_string(),
                    });
                }
            }
        }

        let mut counters: BTreeMap<String, u32> = BTreeMap::new();
        for m in &matches {
            *counters.entry(m.label.clone()).or_insert(0) += 1;
        }

        let processed_text = match mode {
            SanitizerMode::On => {
                // Right-to-left so earlier byte offsets stay valid as we splice.
                matches.sort_by(|a, b| b.start.cmp(&a.start));
                let mut out = text.to_string();
                for m in &matches {
                    let placeholder = if pseudonymise {
                        pseudonym_placeholder(&pack.placeholder_format_pseudonym, &m.label, hash_salt, &m.text)
                    } else {
                        pack.placeholder_format.replace("{TYPE}", &m.label)
                    };
                    out.replace_range(m.start..m.end, &placeholder);
                }
                out
            }
            SanitizerMode::Shadow | SanitizerMode::Off => text.to_string(),
        };

        if audit_enabled {
            if let Err(err) = audit::append(audit_path, doc_id, profile, mode, &counters).await {
                warn!(error = %err, doc_id, "sanitizer audit sink write failed");
            }
        }

        Ok(SanitizeOutcome {
            processed_text,
            counters,
        })
    }
}

fn pseudonym_placeholder(format: &str, label: &str, salt: &str, matched: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(matched.as_bytes());
    let digest = hasher.finalize();
    let hex_prefix: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format.replace("{TYPE}", label).replace("{HASH}", &hex_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_pack(dir: &tempfile::TempDir, profile: &str) {
        let body = r#"{"pii": {"EMAIL": {"pattern": "[\\w.]+@[\\w.]+\\.[a-z]+"}}, "allowlist": {"tokens": ["admin@example.com"]}, "placeholder": {"format": "[{TYPE}]", "format_pseudonym": "[{TYPE}:{HASH}]"}}"#;
        let path = dir.path().join(format!("{profile}.json"));
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn off_mode_is_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(&dir, "default");
        let sanitizer = Sanitizer::new();

        let outcome = sanitizer
            .sanitize(
                "contact me at a@b.com",
                "doc1",
                dir.path().to_str().unwrap(),
                "default",
                SanitizerMode::Off,
                "",
                false,
                false,
                "",
            )
            .await
            .unwrap();

        assert_eq!(outcome.processed_text, "contact me at a@b.com");
        assert!(outcome.counters.is_empty());
    }

    #[tokio::test]
    async fn shadow_mode_counts_but_does_not_modify_text() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(&dir, "default");
        let sanitizer = Sanitizer::new();

        let input = "contact me at a@b.com";
        let outcome = sanitizer
            .sanitize(
                input,
                "doc1",
                dir.path().to_str().unwrap(),
                "default",
                SanitizerMode::Shadow,
                "",
                false,
                false,
                "",
            )
            .await
            .unwrap();

        assert_eq!(outcome.processed_text, input);
        assert_eq!(outcome.counters.get("EMAIL"), Some(&1));
    }

    #[tokio::test]
    async fn shadow_and_on_produce_equal_counters() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(&dir, "default");
        let sanitizer = Sanitizer::new();
        let input = "reach a@b.com or c@d.com";

        let shadow = sanitizer
            .sanitize(input, "doc1", dir.path().to_str().unwrap(), "default", SanitizerMode::Shadow, "", false, false, "")
            .await
            .unwrap();
        let on = sanitizer
            .sanitize(input, "doc1", dir.path().to_str().unwrap(), "default", SanitizerMode::On, "", false, false, "")
            .await
            .unwrap();

        assert_eq!(shadow.counters, on.counters);
        assert_ne!(on.processed_text, input);
    }

    #[tokio::test]
    async fn on_mode_redacts_right_to_left() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(&dir, "default");
        let sanitizer = Sanitizer::new();

        let outcome = sanitizer
            .sanitize(
                "reach a@b.com or c@d.com",
                "doc1",
                dir.path().to_str().unwrap(),
                "default",
                SanitizerMode::On,
                "",
                false,
                false,
                "",
            )
            .await
            .unwrap();

        assert_eq!(outcome.processed_text, "reach [EMAIL] or [EMAIL]");
        assert_eq!(outcome.counters.get("EMAIL"), Some(&2));
    }

    #[tokio::test]
    async fn allowlisted_tokens_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(&dir, "default");
        let sanitizer = Sanitizer::new();

        let outcome = sanitizer
            .sanitize(
                "contact admin@example.com for help",
                "doc1",
                dir.path().to_str().unwrap(),
                "default",
                SanitizerMode::On,
                "",
                false,
                false,
                "",
            )
            .await
            .unwrap();

        assert!(outcome.counters.is_empty());
        assert_eq!(outcome.processed_text, "contact admin@example.com for help");
    }

    #[tokio::test]
    async fn pseudonym_mode_is_idempotent_under_same_salt() {
        let dir = tempfile::tempdir().unwrap();
        write_pack(&dir, "default");
        let sanitizer = Sanitizer::new();
        let input = "reach a@b.com";

        let first = sanitizer
            .sanitize(input, "doc1", dir.path().to_str().unwrap(), "default", SanitizerMode::On, "salt", true, false, "")
            .await
            .unwrap();
        let second = sanitizer
            .sanitize(input, "doc1", dir.path().to_str().unwrap(), "default", SanitizerMode::On, "salt", true, false, "")
            .await
            .unwrap();

        assert_eq!(first.processed_text, second.processed_text);
        assert!(first.processed_text.starts_with("reach [EMAIL:"));
    }
}
