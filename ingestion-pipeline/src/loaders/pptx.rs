use std::io::Read;
use std::path::Path;

use chunker::item::Item;
use common::error::AppError;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

/// PPTX loader (spec.md §4.5 step 2): one `Item` per slide, with the slide's
/// speaker notes (if any) appended after a blank line.
pub async fn load(path: &Path) -> Result<Vec<Item>, AppError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || load_sync(&path))
        .await?
        .map_err(|e| AppError::InvariantViolated(format!("failed to parse PPTX: {e}")))
}

fn load_sync(path: &Path) -> Result<Vec<Item>, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut archive = ZipArchive::new(file).map_err(|e| e.to_string())?;

    let mut slide_indices: Vec<u32> = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|e| e.to_string())?;
        if let Some(n) = slide_number_from_name(entry.name()) {
            slide_indices.push(n);
        }
    }
    slide_indices.sort_unstable();
    slide_indices.dedup();

    if slide_indices.is_empty() {
        return Err("PPTX has no slides".to_string());
    }

    let mut items = Vec::with_capacity(slide_indices.len());
    for slide_number in slide_indices {
        let slide_text = extract_xml_text(&mut archive, &format!("ppt/slides/slide{slide_number}.xml"))
            .unwrap_or_default();
        let notes_text = extract_xml_text(
            &mut archive,
            &format!("ppt/notesSlides/notesSlide{slide_number}.xml"),
        );

        let mut text = slide_text;
        if let Some(notes) = notes_text {
            if !notes.trim().is_empty() {
                text.push_str("\n\nNotes: ");
                text.push_str(notes.trim());
            }
        }

        items.push(Item {
            text,
            slide_number: Some(slide_number),
            ..Default::default()
        });
    }

    Ok(items)
}

fn slide_number_from_name(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("ppt/slides/slide")?;
    let digits = rest.strip_suffix(".xml")?;
    digits.parse().ok()
}

fn extract_xml_text<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    entry_name: &str,
) -> Option<String> {
    let mut entry = archive.by_name(entry_name).ok()?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).ok()?;
    drop(entry);

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);
    let mut text = String::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Text(t)) => {
                if let Ok(decoded) = t.unescape() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&decoded);
                }
            }
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    Some(text)
}
