pub mod docx;
pub mod html;
pub mod pdf;
pub mod pptx;
pub mod txt;
pub mod xlsx;

use std::path::Path;

use chunker::item::Item;
use common::error::AppError;

/// A document's items after loading, before cleaning/sanitization/chunking
/// (spec.md §4.5 step 2). The loader attaches `content_type`/`source` and
/// whatever format-specific metadata (page, slide_number, sheet_name,
/// heading/ancestors) it can determine; cleaning and chunking never see the
/// original bytes again.
pub struct LoadedDocument {
    pub doc_id: String,
    pub content_type: String,
    pub source: String,
    pub items: Vec<Item>,
}

pub async fn load(doc_id: &str, path: &Path) -> Result<LoadedDocument, AppError> {
    let source = path.to_string_lossy().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let (content_type, items): (&str, Vec<Item>) = match extension.as_str() {
        "pdf" => ("application/pdf", pdf::load(path).await?),
        "docx" => (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            docx::load(path).await?,
        ),
        "pptx" => (
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            pptx::load(path).await?,
        ),
        "xlsx" => (
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            xlsx::load(path).await?,
        ),
        "html" | "htm" => ("text/html", html::load(path).await?),
        "txt" | "md" => ("text/plain", txt::load(path).await?),
        other => return Err(AppError::UnsupportedMime(other.to_string())),
    };

    Ok(LoadedDocument {
        doc_id: doc_id.to_string(),
        content_type: content_type.to_string(),
        source,
        items,
    })
}
