use common::{
    config::profile::ChunkerParams,
    error::AppError,
    storage::types::chunk::{Chunk, ChunkKind, ChunkMetadata},
};

use crate::{admin_filter, char_strategy::hash_norm, item::Item};

/// Structured (headings) strategy, plus its TOC-section variant (spec.md
/// §4.2). Document loaders are responsible for deciding the partition
/// boundary itself (preferring level-3, else level-2, within each level-1
/// procedure) — each `Item` here is already one section at that boundary.
/// This strategy's job is prefixing, numeric-prefix preservation, the
/// admin-section filter, and inline figure extraction.
pub fn chunk(
    doc_id: &str,
    items: &[Item],
    params: &ChunkerParams,
    toc_mode: bool,
) -> Result<Vec<Chunk>, AppError> {
    let filtered = admin_filter::filter_sections(items, &params.admin_sections)?;

    let mut out = Vec::new();
    let mut index = 0usize;

    for item in &filtered {
        let heading = item.heading.clone().unwrap_or_default();
        let procedure = item
            .ancestors
            .first()
            .cloned()
            .unwrap_or_else(|| heading.clone());

        let mut path_parts = item.ancestors.clone();
        let section_label = if toc_mode {
            match &item.numeric_prefix {
                Some(prefix) => format!("{prefix} {heading}"),
                None => heading.clone(),
            }
        } else {
            match &item.numeric_prefix {
                Some(prefix) => format!("{prefix} {heading}"),
                None => heading.clone(),
            }
        };
        path_parts.push(section_label.clone());
        let path = path_parts.join("|");

        let header = format!(
            "Procedure: {procedure}\nSection: {section_label}\nPath: {path}\n\n"
        );

        let (text_with_markers, figures) = inline_figures(&item.text, doc_id, index, item);
        let body = format!("{header}{text_with_markers}");

        out.push(Chunk {
            chunk_id: Chunk::chunk_id_for(doc_id, index),
            doc_id: doc_id.to_string(),
            text: body.clone(),
            source: doc_id.to_string(),
            embedding: Vec::new(),
            hash_norm: hash_norm(&body),
            kind: ChunkKind::Text,
            metadata: ChunkMetadata {
                page: item.page,
                slide_number: item.slide_number,
                sheet_name: item.sheet_name.clone(),
                block_type: item.block_type.clone(),
                section_path: Some(path),
                ..Default::default()
            },
        });
        let parent_chunk_id = out.last().unwrap().chunk_id.clone();
        index += 1;

        for (local_index, figure) in figures.into_iter().enumerate() {
            let figure_chunk_id = format!("{}_{}", Chunk::chunk_id_for(doc_id, index), figure.figure_id);
            let description = match &figure.caption {
                Some(caption) => format!("Figure {} ({}): {}", figure.figure_id, figure.filename, caption),
                None => format!("Figure {} ({})", figure.figure_id, figure.filename),
            };
            out.push(Chunk {
                chunk_id: figure_chunk_id,
                doc_id: doc_id.to_string(),
                text: description.clone(),
                source: doc_id.to_string(),
                embedding: Vec::new(),
                hash_norm: hash_norm(&description),
                kind: ChunkKind::Figure {
                    figure_id: figure.figure_id,
                    image_ref: figure.image_ref,
                    parent_chunk_id: parent_chunk_id.clone(),
                    parent_chunk_local_index: local_index,
                },
                metadata: ChunkMetadata::default(),
            });
            index += 1;
        }
    }

    Ok(out)
}

struct ExtractedFigure {
    figure_id: String,
    image_ref: String,
    filename: String,
    caption: Option<String>,
}

/// Inserts `[FIGURE:<figure_id>]` markers at each inline image's offset and
/// returns the figure descriptions to emit as separate `chunk_type=figure`
/// chunks (spec.md §4.2 "Inline figures").
fn inline_figures(text: &str, doc_id: &str, section_index: usize, item: &Item) -> (String, Vec<ExtractedFigure>) {
    if item.images.is_empty() {
        return (text.to_string(), Vec::new());
    }

    let mut images = item.images.clone();
    images.sort_by_key(|img| img.offset);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    let mut figures = Vec::with_capacity(images.len());

    for image in &images {
        let offset = image.offset.min(text.len());
        out.push_str(&text[cursor..offset]);
        out.push_str(&format!("[FIGURE:{}]", image.figure_id));
        cursor = offset;

        figures.push(ExtractedFigure {
            figure_id: image.figure_id.clone(),
            image_ref: image.image_ref.clone(),
            filename: image.filename.clone(),
            caption: image.caption.clone(),
        });
    }
    out.push_str(&text[cursor..]);

    let _ = (doc_id, section_index);
    (out, figures)
}
