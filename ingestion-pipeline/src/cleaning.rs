use unicode_normalization::UnicodeNormalization;

/// Deterministic text cleaning (spec.md §4.5 step 3). Every transform here
/// is pure and order-sensitive: NFC normalise, strip zero-width and soft
/// hyphen, map NBSP to a regular space, swap common ligatures, normalise
/// line endings, de-hyphenate across line breaks, then collapse horizontal
/// whitespace (never newlines) and drop noise blocks.
pub fn clean(text: &str) -> String {
    let normalized: String = text.nfc().collect();
    let stripped = strip_invisible(&normalized);
    let ligatures_replaced = replace_ligatures(&stripped);
    let crlf_normalized = ligatures_replaced.replace("\r\n", "\n").replace('\r', "\n");
    let dehyphenated = dehyphenate(&crlf_normalized);

    dehyphenated
        .lines()
        .map(collapse_line)
        .filter(|line| !is_noise_block(line))
        .collect::<Vec<_>>()
        .join("\n")
}

const ZERO_WIDTH: [char; 4] = ['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];
const SOFT_HYPHEN: char = '\u{00AD}';
const NBSP: char = '\u{00A0}';

fn strip_invisible(text: &str) -> String {
    text.chars()
        .filter(|c| !ZERO_WIDTH.contains(c) && *c != SOFT_HYPHEN)
        .map(|c| if c == NBSP { ' ' } else { c })
        .collect()
}

const LIGATURES: &[(&str, &str)] = &[
    ("\u{FB00}", "ff"),
    ("\u{FB01}", "fi"),
    ("\u{FB02}", "fl"),
    ("\u{FB03}", "ffi"),
    ("\u{FB04}", "ffl"),
];

fn replace_ligatures(text: &str) -> String {
    let mut out = text.to_string();
    for (ligature, replacement) in LIGATURES {
        out = out.replace(ligature, replacement);
    }
    out
}

/// Joins a trailing hyphen at a line break with the next line's leading word
/// when the break looks like mid-word wrapping (hyphen immediately preceded
/// by a lowercase letter, next line starting lowercase).
fn dehyphenate(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some(stripped) = line.strip_suffix('-') {
            let joins_next = stripped
                .chars()
                .last()
                .is_some_and(|c| c.is_lowercase())
                && lines
                    .get(i + 1)
                    .and_then(|next| next.chars().next())
                    .is_some_and(|c| c.is_lowercase());
            if joins_next {
                out.push_str(stripped);
                i += 1;
                continue;
            }
        }
        out.push_str(line);
        if i + 1 < lines.len() {
            out.push('\n');
        }
        i += 1;
    }
    out
}

fn collapse_line(line: &str) -> String {
    let collapsed = line.split(' ').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");
    collapsed.trim_end().to_string()
}

/// Drops lines with fewer than 10 alphabetic characters unless they look
/// like a heading (start with a capital letter or a numeric prefix).
fn is_noise_block(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    let alpha_count = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    if alpha_count >= 10 {
        return false;
    }
    let looks_like_heading = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase() || c.is_numeric());
    !looks_like_heading
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_spaces_but_not_newlines() {
        let input = "Hello    world\n\nNext   paragraph";
        assert_eq!(clean(input), "Hello world\n\nNext paragraph");
    }

    #[test]
    fn strips_zero_width_and_nbsp() {
        let input = "Hello\u{200B}\u{00A0}World";
        assert_eq!(clean(input), "Hello World");
    }

    #[test]
    fn dehyphenates_across_line_breaks() {
        let input = "This is a hyphen-\nated word.";
        assert_eq!(clean(input), "This is a hyphenated word.");
    }

    #[test]
    fn drops_short_non_heading_noise_lines() {
        let input = "Real paragraph with enough alphabetic content.\n...\n12\nAnother real sentence here.";
        let cleaned = clean(input);
        assert!(!cleaned.contains("..."));
        assert!(cleaned.contains("Real paragraph"));
    }

    #[test]
    fn replaces_common_ligatures() {
        assert_eq!(clean("\u{FB01}rst"), "first");
    }
}
