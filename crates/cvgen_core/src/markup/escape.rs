//! Free-text escaping and inline link rewriting.
//!
//! # Invariants
//! - `& % $ # _ { }` are escaped exactly once per pass.
//! - Markdown links `[label](url)` become `\href{url}{label}`; only the
//!   characters outside links and the link label are text-escaped.

use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]*)\)").expect("valid link regex"));

/// Escapes LaTeX-reserved characters in plain text.
pub fn escape_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        if matches!(ch, '&' | '%' | '$' | '#' | '_' | '{' | '}') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Escapes the characters a hyperlink target cannot carry verbatim.
pub fn escape_url(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len() + 4);
    for ch in raw.chars() {
        if matches!(ch, '%' | '#') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Builds a hyperlink; `display_markup` must already be escaped.
pub fn href(target: &str, display_markup: &str) -> String {
    format!("\\href{{{}}}{{{}}}", escape_url(target), display_markup)
}

/// Escapes free text and rewrites inline Markdown links.
pub fn render_text(raw: &str) -> String {
    let mut rendered = String::with_capacity(raw.len() + 16);
    let mut cursor = 0;
    for captures in MARKDOWN_LINK_RE.captures_iter(raw) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        rendered.push_str(&escape_text(&raw[cursor..whole.start()]));
        let label = captures.get(1).map_or("", |m| m.as_str());
        let target = captures.get(2).map_or("", |m| m.as_str());
        rendered.push_str(&href(target, &escape_text(label)));
        cursor = whole.end();
    }
    rendered.push_str(&escape_text(&raw[cursor..]));
    rendered
}
