use std::path::{Path, PathBuf};

use common::error::AppError;
use serde::Deserialize;
use serde_json::Value;

/// One line of an on-disk manifest (spec.md §6.3).
#[derive(Clone, Debug, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    pub doc_id: Option<String>,
    pub profile: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub lang: Option<String>,
    pub priority: Option<u8>,
    #[serde(default)]
    pub metadata: Value,
}

/// A manifest entry after glob expansion, bound to one concrete file.
#[derive(Clone, Debug)]
pub struct ResolvedDocument {
    pub doc_id: String,
    pub path: PathBuf,
    pub profile: Option<String>,
    pub tags: Vec<String>,
    pub lang: Option<String>,
    pub priority: Option<u8>,
    pub metadata: Value,
}

/// Parses a JSON-Lines manifest. Blank lines are skipped.
pub fn parse_manifest(contents: &str) -> Result<Vec<ManifestEntry>, AppError> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| AppError::BadRequest(format!("invalid manifest line: {e}")))
        })
        .collect()
}

/// Expands every entry's `path` (resolved relative to `manifest_dir`, may be
/// a glob) into one or more resolved documents. Globbed matches get suffixed
/// `doc_id`s (`<base>_<N>`). A path matching nothing fails the whole job
/// (spec.md §4.5 step 1).
pub fn expand_manifest(
    entries: &[ManifestEntry],
    manifest_dir: &Path,
) -> Result<Vec<ResolvedDocument>, AppError> {
    let mut out = Vec::new();

    for entry in entries {
        let pattern = manifest_dir.join(&entry.path);
        let pattern_str = pattern.to_string_lossy().to_string();

        let matches: Vec<PathBuf> = glob::glob(&pattern_str)
            .map_err(|e| AppError::BadRequest(format!("invalid glob {pattern_str}: {e}")))?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();

        if matches.is_empty() {
            return Err(AppError::BadRequest(format!(
                "manifest entry matched no files: {}",
                entry.path
            )));
        }

        let base = entry.doc_id.clone().unwrap_or_else(|| {
            pattern
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "doc".to_string())
        });

        let suffix_needed = matches.len() > 1;
        for (index, path) in matches.into_iter().enumerate() {
            let doc_id = if suffix_needed {
                format!("{base}_{index}")
            } else {
                base.clone()
            };
            out.push(ResolvedDocument {
                doc_id,
                path,
                profile: entry.profile.clone(),
                tags: entry.tags.clone(),
                lang: entry.lang.clone(),
                priority: entry.priority,
                metadata: entry.metadata.clone(),
            });
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_manifest_lines_skipping_blanks() {
        let text = "{\"path\": \"a.txt\"}\n\n{\"path\": \"b/*.pdf\", \"doc_id\": \"b\"}\n";
        let entries = parse_manifest(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].doc_id.as_deref(), Some("b"));
    }

    #[test]
    fn missing_path_fails_the_whole_job() {
        let dir = tempfile::tempdir().unwrap();
        let entries = vec![ManifestEntry {
            path: "does_not_exist.txt".to_string(),
            doc_id: None,
            profile: None,
            tags: vec![],
            lang: None,
            priority: None,
            metadata: Value::Null,
        }];
        let result = expand_manifest(&entries, dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn glob_matches_get_suffixed_doc_ids() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "hello").unwrap();
        }
        let entries = vec![ManifestEntry {
            path: "*.txt".to_string(),
            doc_id: Some("doc".to_string()),
            profile: None,
            tags: vec![],
            lang: None,
            priority: None,
            metadata: Value::Null,
        }];
        let resolved = expand_manifest(&entries, dir.path()).unwrap();
        assert_eq!(resolved.len(), 2);
        let ids: Vec<_> = resolved.iter().map(|r| r.doc_id.clone()).collect();
        assert!(ids.contains(&"doc_0".to_string()));
        assert!(ids.contains(&"doc_1".to_string()));
    }
}
