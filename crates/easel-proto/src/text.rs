//! Plain-text helpers: word budgets and HTML cleanup.

use scraper::{ElementRef, Html};

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep the first `max_words` words of `text`, preserving the original
/// separators (line breaks survive). Longer input gets a truncation notice
/// appended; input within budget is returned unchanged.
pub fn truncate_to_words(text: &str, max_words: usize) -> String {
    match word_boundary(text, max_words) {
        None => text.to_string(),
        Some(end) => format!(
            "{}\n\n[Note: The original text was longer than {} words and has been truncated.]",
            &text[..end],
            max_words
        ),
    }
}

/// Byte offset just past the `max_words`-th word, or `None` when the text
/// has no more than `max_words` words.
fn word_boundary(text: &str, max_words: usize) -> Option<usize> {
    let mut words = 0usize;
    let mut in_word = false;
    let mut end = 0usize;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if in_word {
                in_word = false;
                end = idx;
            }
        } else if !in_word {
            if words == max_words {
                return Some(end);
            }
            in_word = true;
            words += 1;
        }
    }
    None
}

/// Text content of an HTML fragment with entities decoded. Block elements
/// (`p`, `br`, `li`, `div`) start and end a line.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut out);
    out.replace('\u{a0}', " ").trim().to_string()
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let block = matches!(child.value().name(), "br" | "p" | "li" | "div");
            if block {
                line_break(out);
            }
            collect_text(child, out);
            if block {
                line_break(out);
            }
        }
    }
}

fn line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}
