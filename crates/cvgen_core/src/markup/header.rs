//! Name and contact header.
//!
//! # Invariants
//! - Recognized contact keys render in a fixed order, then unrecognized keys
//!   in document order.
//! - Empty and non-scalar contact values are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use super::block::Block;
use super::escape::{escape_text, href, render_text};
use crate::model::document::{Document, CONTACT_KEY, NAME_KEY};
use crate::model::value::scalar_text;

const CONTACT_SEPARATOR: &str = " | ";
const DEFAULT_FIRST_NAME: &str = "John";
const DEFAULT_LAST_NAME: &str = "Doe";

static URL_DISPLAY_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:https?://)?(?:www\.)?").expect("valid url prefix regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactStyle {
    Mail,
    Plain,
    Link,
}

struct ContactKey {
    key: &'static str,
    icon: &'static str,
    style: ContactStyle,
}

const CONTACT_KEYS: [ContactKey; 7] = [
    ContactKey { key: "email", icon: r"\faEnvelope", style: ContactStyle::Mail },
    ContactKey { key: "phone", icon: r"\faPhone", style: ContactStyle::Plain },
    ContactKey { key: "portfolio", icon: r"\faGlobe", style: ContactStyle::Link },
    ContactKey { key: "website", icon: r"\faGlobe", style: ContactStyle::Link },
    ContactKey { key: "url", icon: r"\faGlobe", style: ContactStyle::Link },
    ContactKey { key: "linkedin", icon: r"\faLinkedin", style: ContactStyle::Link },
    ContactKey { key: "github", icon: r"\faGithub", style: ContactStyle::Link },
];

/// Builds the `\namesection{first}{last}{contact line}` block.
pub fn header_block(document: &Document) -> Block {
    let (first, last) = person_name(document.get(NAME_KEY));
    let contact = document
        .get(CONTACT_KEY)
        .and_then(Value::as_mapping)
        .map(contact_line)
        .unwrap_or_default();
    Block::Command {
        name: "namesection",
        args: vec![escape_text(&first), escape_text(&last), contact],
    }
}

/// Resolves first and last name, defaulting each missing part.
fn person_name(value: Option<&Value>) -> (String, String) {
    let (first, last) = match value {
        Some(Value::Mapping(fields)) => (
            field_text(fields, "first"),
            field_text(fields, "last"),
        ),
        Some(value) => match scalar_text(value).map(|text| text.trim().to_string()) {
            Some(full) if !full.is_empty() => match full.rsplit_once(' ') {
                Some((first, last)) => (Some(first.trim().to_string()), Some(last.to_string())),
                None => (Some(full), None),
            },
            _ => (None, None),
        },
        None => (None, None),
    };
    (
        first.unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string()),
        last.unwrap_or_else(|| DEFAULT_LAST_NAME.to_string()),
    )
}

fn field_text(fields: &Mapping, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(scalar_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Renders the contact mapping into one separator-joined line.
pub fn contact_line(contact: &Mapping) -> String {
    let entries: Vec<(String, String)> = contact
        .iter()
        .filter_map(|(key, value)| {
            let key = key.as_str()?;
            let text = scalar_text(value)?.trim().to_string();
            (!text.is_empty()).then(|| (key.to_ascii_lowercase(), text))
        })
        .collect();

    let mut parts = Vec::new();
    for known in &CONTACT_KEYS {
        if let Some((_, value)) = entries.iter().find(|(key, _)| key == known.key) {
            parts.push(render_contact(known, value));
        }
    }
    for (key, value) in &entries {
        if CONTACT_KEYS.iter().any(|known| known.key == key) {
            continue;
        }
        parts.push(render_text(value));
    }
    parts.join(CONTACT_SEPARATOR)
}

fn render_contact(known: &ContactKey, value: &str) -> String {
    match known.style {
        ContactStyle::Mail => href(
            &format!("mailto:{value}"),
            &format!("{}\\ {}", known.icon, escape_text(value)),
        ),
        ContactStyle::Plain => format!("{}\\ {}", known.icon, escape_text(value)),
        ContactStyle::Link => {
            let display = URL_DISPLAY_PREFIX_RE.replace(value, "");
            href(value, &format!("{}\\ {}", known.icon, escape_text(&display)))
        }
    }
}
