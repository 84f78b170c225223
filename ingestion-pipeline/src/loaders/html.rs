use std::path::Path;

use chunker::item::Item;
use common::error::AppError;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// HTML loader (spec.md §4.5 step 2): one `Item` per top-level section,
/// where a section boundary is an `<h1>`/`<h2>` heading. Text inside
/// `<script>`/`<style>` is dropped; everything else is flattened to text
/// in document order.
pub async fn load(path: &Path) -> Result<Vec<Item>, AppError> {
    let html = tokio::fs::read_to_string(path).await?;
    Ok(split_sections(&html))
}

fn split_sections(html: &str) -> Vec<Item> {
    let mut reader = Reader::from_str(html);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut current_heading: Option<String> = None;
    let mut current_text = String::new();
    let mut in_heading = false;
    let mut skip_depth = 0u32;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(tag)) => {
                let name = local_name(&tag.name().as_ref().to_vec());
                if name == "script" || name == "style" {
                    skip_depth += 1;
                } else if matches!(name.as_str(), "h1" | "h2") {
                    flush_section(&mut items, &mut current_heading, &mut current_text);
                    in_heading = true;
                }
            }
            Ok(Event::End(tag)) => {
                let name = local_name(&tag.name().as_ref().to_vec());
                if name == "script" || name == "style" {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if matches!(name.as_str(), "h1" | "h2") {
                    in_heading = false;
                }
            }
            Ok(Event::Text(text)) | Ok(Event::CData(text)) => {
                if skip_depth > 0 {
                    buf.clear();
                    continue;
                }
                let decoded = text.unescape().unwrap_or_default().trim().to_string();
                if decoded.is_empty() {
                    buf.clear();
                    continue;
                }
                if in_heading {
                    let heading = current_heading.get_or_insert_with(String::new);
                    if !heading.is_empty() {
                        heading.push(' ');
                    }
                    heading.push_str(&decoded);
                } else {
                    if !current_text.is_empty() {
                        current_text.push(' ');
                    }
                    current_text.push_str(&decoded);
                }
            }
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    flush_section(&mut items, &mut current_heading, &mut current_text);

    if items.is_empty() {
        items.push(Item::default());
    }
    items
}

fn flush_section(items: &mut Vec<Item>, heading: &mut Option<String>, text: &mut String) {
    if heading.is_some() || !text.trim().is_empty() {
        items.push(Item {
            text: std::mem::take(text),
            heading: heading.take(),
            heading_level: Some(1),
            ..Default::default()
        });
    }
}

fn local_name(qname: &[u8]) -> String {
    String::from_utf8_lossy(qname).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_h1_and_h2_boundaries() {
        let html = "<html><body><h1>Intro</h1><p>Welcome.</p><h2>Setup</h2><p>Plug it in.</p></body></html>";
        let items = split_sections(html);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].heading.as_deref(), Some("Intro"));
        assert!(items[0].text.contains("Welcome"));
        assert_eq!(items[1].heading.as_deref(), Some("Setup"));
    }

    #[test]
    fn drops_script_and_style_content() {
        let html = "<html><head><style>body{color:red}</style></head><body><script>alert(1)</script><p>Real content.</p></body></html>";
        let items = split_sections(html);
        assert_eq!(items.len(), 1);
        assert!(items[0].text.contains("Real content"));
        assert!(!items[0].text.contains("alert"));
    }
}
