use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chunker::item::Item;
use common::error::AppError;

const MAX_ROWS_PER_SUMMARY: usize = 200;

/// XLSX loader (spec.md §4.5 step 2): one `Item` per sheet, rendered as a
/// row-by-row summary (not a raw cell dump) so the chunker sees readable
/// text rather than a CSV blob.
pub async fn load(path: &Path) -> Result<Vec<Item>, AppError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || load_sync(&path))
        .await?
        .map_err(|e| AppError::InvariantViolated(format!("failed to parse XLSX: {e}")))
}

fn load_sync(path: &Path) -> Result<Vec<Item>, String> {
    let mut workbook: calamine::Sheets<_> = open_workbook_auto(path).map_err(|e| e.to_string())?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err("workbook has no sheets".to_string());
    }

    let mut items = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| format!("sheet {name}: {e}"))?;

        let mut header: Vec<String> = Vec::new();
        let mut lines = Vec::new();

        for (row_index, row) in range.rows().enumerate() {
            if row_index == 0 {
                header = row.iter().map(cell_to_string).collect();
                continue;
            }
            if row_index > MAX_ROWS_PER_SUMMARY {
                lines.push(format!(
                    "... {} more rows omitted",
                    range.rows().count().saturating_sub(MAX_ROWS_PER_SUMMARY + 1)
                ));
                break;
            }
            let summary = row
                .iter()
                .enumerate()
                .filter_map(|(i, cell)| {
                    let value = cell_to_string(cell);
                    if value.is_empty() {
                        return None;
                    }
                    let label = header.get(i).cloned().unwrap_or_else(|| format!("col{i}"));
                    Some(format!("{label}: {value}"))
                })
                .collect::<Vec<_>>()
                .join(", ");
            if !summary.is_empty() {
                lines.push(summary);
            }
        }

        items.push(Item {
            text: lines.join("\n"),
            sheet_name: Some(name),
            ..Default::default()
        });
    }

    Ok(items)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(d) => d.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERROR({e:?})"),
    }
}
