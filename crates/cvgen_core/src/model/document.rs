//! Résumé document: an ordered mapping from section name to section content.
//!
//! # Responsibility
//! - Parse and serialize the structured text form of a résumé.
//! - Own reserved key names and resolve section emission order.
//!
//! # Invariants
//! - Top-level key order is preserved exactly as parsed or inserted.
//! - Ordering resolution never yields a reserved key or a duplicate name.
//! - Names listed in `_order` without content are skipped.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::value::value_kind;

/// Explicit section ordering (sequence of section names).
pub const ORDER_KEY: &str = "_order";
/// Template/class reference (`deedy`, `deedy.cls`, `cls/deedy.cls`).
pub const TEMPLATE_KEY: &str = "cls";
/// Explicit section placement (`{section: left|right}`).
pub const COLUMNS_KEY: &str = "_columns";
/// Person name record (`{first, last}`).
pub const NAME_KEY: &str = "name";
/// Contact record rendered into the header line.
pub const CONTACT_KEY: &str = "contact";
/// Item-level left-column flag consulted on the first item of a section.
pub const LEFT_FLAG_KEY: &str = "left";

/// Keys that never render as body sections.
pub const RESERVED_KEYS: [&str; 5] = [ORDER_KEY, TEMPLATE_KEY, COLUMNS_KEY, NAME_KEY, CONTACT_KEY];

/// Document-level settings that are not editable sections.
pub const META_KEYS: [&str; 3] = [ORDER_KEY, TEMPLATE_KEY, COLUMNS_KEY];

/// Returns whether `key` is excluded from body rendering.
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Returns whether `key` is a document-level setting rather than a section.
pub fn is_meta_key(key: &str) -> bool {
    META_KEYS.contains(&key)
}

/// Output column a section is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Left,
    Right,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Parses `left`/`right`, case-insensitive and whitespace-tolerant.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Errors raised while reading or writing the document text form.
#[derive(Debug)]
pub enum DocumentError {
    /// Structured text is malformed.
    Parse(serde_yaml::Error),
    /// Root value is valid structured text but not a mapping.
    NotAMapping(&'static str),
    /// In-memory content could not be encoded.
    Serialize(serde_yaml::Error),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "malformed document: {err}"),
            Self::NotAMapping(kind) => {
                write!(f, "document root must be a mapping of sections, found {kind}")
            }
            Self::Serialize(err) => write!(f, "document encode failed: {err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) | Self::Serialize(err) => Some(err),
            Self::NotAMapping(_) => None,
        }
    }
}

/// Structured résumé document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Mapping,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_mapping(root: Mapping) -> Self {
        Self { root }
    }

    /// Wraps an already-parsed value.
    ///
    /// `null` (an empty file) becomes an empty document.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Mapping(root) => Ok(Self { root }),
            Value::Tagged(tagged) => Self::from_value(tagged.value),
            other => Err(DocumentError::NotAMapping(value_kind(&other))),
        }
    }

    /// Parses the persisted text form.
    ///
    /// Text made only of blank lines and comments yields an empty document.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let has_content = text.lines().any(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        });
        if !has_content {
            return Ok(Self::new());
        }
        let value: Value = serde_yaml::from_str(text).map_err(DocumentError::Parse)?;
        Self::from_value(value)
    }

    /// Serializes the document in its current key order.
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        serde_yaml::to_string(&self.root).map_err(DocumentError::Serialize)
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn into_mapping(self) -> Mapping {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Inserts or replaces one top-level entry.
    ///
    /// Replacing keeps the entry at its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.root.insert(Value::String(key.into()), value)
    }

    /// Iterates string-keyed top-level entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.root
            .iter()
            .filter_map(|(key, value)| key.as_str().map(|name| (name, value)))
    }

    /// Iterates string top-level keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries().map(|(key, _)| key)
    }

    /// Returns the explicit ordering list when `_order` is a sequence.
    pub fn order(&self) -> Option<Vec<String>> {
        let sequence = self.get(ORDER_KEY)?.as_sequence()?;
        Some(
            sequence
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Returns the non-blank template reference, if any.
    pub fn template(&self) -> Option<&str> {
        self.get(TEMPLATE_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Returns the explicit placement for `section`, if any.
    pub fn column_override(&self, section: &str) -> Option<Column> {
        self.get(COLUMNS_KEY)?
            .as_mapping()?
            .get(section)?
            .as_str()
            .and_then(Column::parse)
    }

    /// Resolves body-section emission order.
    ///
    /// Names from `_order` come first (when present, not reserved and backed
    /// by content), then every remaining non-reserved key in document order.
    pub fn ordered_section_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        if let Some(order) = self.order() {
            for name in order {
                if is_reserved_key(&name) || !self.contains(&name) || names.contains(&name) {
                    continue;
                }
                names.push(name);
            }
        }
        for key in self.keys() {
            if is_reserved_key(key) || names.iter().any(|name| name == key) {
                continue;
            }
            names.push(key.to_string());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::{Column, Document, DocumentError};

    #[test]
    fn natural_order_is_used_without_order_key() {
        let document = Document::parse(
            "skills: [python, git]\nexperience: [{company: Y}]\neducation: [{institution: X}]\nname: {first: A, last: B}\ncontact: {email: a@b.com}\n",
        )
        .unwrap();
        assert_eq!(
            document.ordered_section_names(),
            vec!["skills", "experience", "education"]
        );
    }

    #[test]
    fn order_key_comes_first_then_unlisted_sections() {
        let document = Document::parse(
            "_order: [education, ghost, name, education]\nskills: [a]\neducation: [{degree: BSc}]\nawards: [b]\n",
        )
        .unwrap();
        assert_eq!(
            document.ordered_section_names(),
            vec!["education", "skills", "awards"]
        );
    }

    #[test]
    fn non_sequence_order_key_is_ignored() {
        let document = Document::parse("_order: skills\nawards: [a]\nskills: [b]\n").unwrap();
        assert_eq!(document.order(), None);
        assert_eq!(document.ordered_section_names(), vec!["awards", "skills"]);
    }

    #[test]
    fn comment_only_text_is_an_empty_document() {
        let document = Document::parse("# skills:\n# - python\n\n").unwrap();
        assert!(document.is_empty());
    }

    #[test]
    fn scalar_root_is_rejected() {
        let error = Document::parse("- a\n- b\n").expect_err("sequence root must fail");
        assert!(matches!(error, DocumentError::NotAMapping("sequence")));
        assert!(error.to_string().contains("mapping"));
    }

    #[test]
    fn malformed_text_reports_parse_error() {
        let error = Document::parse("skills: [a, b\n").expect_err("unclosed flow must fail");
        assert!(matches!(error, DocumentError::Parse(_)));
    }

    #[test]
    fn template_and_column_override_are_read() {
        let document =
            Document::parse("cls: ' cls/deedy.cls '\n_columns: {skills: LEFT, awards: middle}\n")
                .unwrap();
        assert_eq!(document.template(), Some("cls/deedy.cls"));
        assert_eq!(document.column_override("skills"), Some(Column::Left));
        assert_eq!(document.column_override("awards"), None);
        assert_eq!(document.column_override("missing"), None);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut document = Document::parse("a: 1\nb: 2\n").unwrap();
        document.insert("a", serde_yaml::Value::from(3));
        assert_eq!(document.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(document.to_yaml().unwrap(), "a: 3\nb: 2\n");
    }
}
