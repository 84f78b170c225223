use std::collections::BTreeMap;

use common::error::AppError;
use serde::Serialize;
use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::sanitizer::{mode_label, SanitizerMode};

#[derive(Serialize)]
struct AuditLine<'a> {
    doc_id: &'a str,
    profile: &'a str,
    mode: &'a str,
    redactions: &'a BTreeMap<String, u32>,
}

/// Append-only JSON-lines sink, one line per sanitised document with
/// non-zero counters (spec.md §4.1 step 5, §6.5). A compliance artifact,
/// not a log level — kept distinct from `tracing` (SPEC_FULL.md §10.1).
pub async fn append(
    audit_path: &str,
    doc_id: &str,
    profile: &str,
    mode: SanitizerMode,
    counters: &BTreeMap<String, u32>,
) -> Result<(), AppError> {
    if counters.values().all(|&c| c == 0) {
        return Ok(());
    }

    if let Some(parent) = std::path::Path::new(audit_path).parent() {
        tokio::fs::create_dir_all(parent).await.map_err(AppError::Io)?;
    }

    let line = AuditLine {
        doc_id,
        profile,
        mode: mode_label(mode),
        redactions: counters,
    };
    let mut serialized = serde_json::to_string(&line)
        .map_err(|e| AppError::InvariantViolated(format!("audit line serialization: {e}")))?;
    serialized.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(audit_path)
        .await
        .map_err(AppError::Io)?;
    file.write_all(serialized.as_bytes()).await.map_err(AppError::Io)?;

    Ok(())
}
