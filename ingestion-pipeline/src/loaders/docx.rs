use std::path::Path;

use chunker::item::Item;
use common::error::AppError;
use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use regex::Regex;

/// DOCX loader (spec.md §4.5 step 2): one `Item` per section, where a
/// section boundary is a paragraph styled as a heading (`Heading1`..`Heading3`
/// in the document's style map). Numeric prefixes already present in a
/// heading's text (e.g. `3.2 Configuration`) are split out and preserved
/// verbatim rather than being re-derived.
pub async fn load(path: &Path) -> Result<Vec<Item>, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let docx = tokio::task::spawn_blocking(move || read_docx(&bytes))
        .await?
        .map_err(|e| AppError::InvariantViolated(format!("failed to parse DOCX: {e:?}")))?;

    let numeric_prefix = Regex::new(r"^(\d+(?:\.\d+)*)\s+(.*)$").expect("static pattern");

    let mut items: Vec<Item> = Vec::new();
    let mut ancestors: Vec<(u8, String)> = Vec::new();

    for child in &docx.document.children {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };

        let text = paragraph_text(paragraph);
        if text.trim().is_empty() {
            continue;
        }

        let heading_level = heading_level(paragraph);

        if let Some(level) = heading_level {
            ancestors.retain(|(l, _)| *l < level);
            let (numeric, label) = match numeric_prefix.captures(&text) {
                Some(caps) => (
                    Some(caps.get(1).expect("group 1").as_str().to_string()),
                    caps.get(2).expect("group 2").as_str().to_string(),
                ),
                None => (None, text.clone()),
            };

            let ancestor_labels: Vec<String> = ancestors.iter().map(|(_, l)| l.clone()).collect();
            items.push(Item {
                text: String::new(),
                heading: Some(label.clone()),
                heading_level: Some(level),
                ancestors: ancestor_labels,
                numeric_prefix: numeric,
                ..Default::default()
            });
            ancestors.push((level, label));
        } else if let Some(last) = items.last_mut() {
            if !last.text.is_empty() {
                last.text.push(' ');
            }
            last.text.push_str(&text);
        } else {
            items.push(Item {
                text,
                ..Default::default()
            });
        }
    }

    if items.is_empty() {
        return Err(AppError::InvariantViolated(
            "DOCX has no extractable paragraphs".to_string(),
        ));
    }

    Ok(items)
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

fn heading_level(paragraph: &docx_rs::Paragraph) -> Option<u8> {
    let style_id = paragraph.property.style.as_ref().map(|s| s.val.as_str())?;
    let lower = style_id.to_lowercase();
    if !lower.starts_with("heading") {
        return None;
    }
    lower
        .trim_start_matches("heading")
        .trim()
        .parse::<u8>()
        .ok()
        .or(Some(1))
}
