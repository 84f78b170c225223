use common::{config::profile::AdminSectionFilter, error::AppError};
use regex::Regex;

use crate::item::Item;

/// Admin-section filter for the structured/TOC-section strategies
/// (spec.md §4.2): drops sections whose heading matches any configured
/// `heading_regex`. Once a dropped section is seen, everything after it
/// stays dropped until a heading matches `stop_excluding_after_heading_regex`
/// — re-enabling inclusion permanently for the rest of the document.
pub fn filter_sections(items: &[Item], filter: &AdminSectionFilter) -> Result<Vec<Item>, AppError> {
    if filter.heading_regex.is_empty() {
        return Ok(items.to_vec());
    }

    let admin_patterns: Vec<Regex> = filter
        .heading_regex
        .iter()
        .map(|p| Regex::new(p))
        .collect::<Result<_, _>>()?;
    let stop_pattern = filter
        .stop_excluding_after_heading_regex
        .as_deref()
        .map(Regex::new)
        .transpose()?;

    let mut out = Vec::with_capacity(items.len());
    let mut excluding = false;

    for item in items {
        let heading = item.heading.as_deref().unwrap_or("");

        if excluding {
            if let Some(stop) = &stop_pattern {
                if stop.is_match(heading) {
                    excluding = false;
                    out.push(item.clone());
                }
            }
            continue;
        }

        if admin_patterns.iter().any(|p| p.is_match(heading)) {
            excluding = true;
            continue;
        }

        out.push(item.clone());
    }

    Ok(out)
}
