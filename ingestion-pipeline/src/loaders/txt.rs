use std::path::Path;

use chunker::item::Item;
use common::error::AppError;

/// TXT loader (spec.md §4.5 step 2): whole document, or one `Item` per
/// blank-line-delimited paragraph block when the file has more than one.
pub async fn load(path: &Path) -> Result<Vec<Item>, AppError> {
    let text = tokio::fs::read_to_string(path).await?;

    let blocks: Vec<&str> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .collect();

    if blocks.len() <= 1 {
        return Ok(vec![Item {
            text,
            ..Default::default()
        }]);
    }

    Ok(blocks
        .into_iter()
        .map(|block| Item {
            text: block.to_string(),
            ..Default::default()
        })
        .collect())
}
