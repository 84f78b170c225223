use std::path::Path;

use chunker::item::Item;
use common::error::AppError;

/// PDF loader (spec.md §4.5 step 2): one `Item` per page, using the text
/// layer only. Scanned/OCR-only PDFs are out of scope for this loader —
/// `Profile.ocr` selects a different ingestion path upstream.
pub async fn load(path: &Path) -> Result<Vec<Item>, AppError> {
    let bytes = tokio::fs::read(path).await?;

    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .await?
        .map_err(|e| AppError::InvariantViolated(format!("failed to extract PDF text: {e}")))?;

    if pages.is_empty() {
        return Err(AppError::InvariantViolated(
            "PDF has no extractable pages".to_string(),
        ));
    }

    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(index, text)| Item {
            text,
            page: Some(index as u32 + 1),
            ..Default::default()
        })
        .collect())
}
