//! Editable per-section representation.
//!
//! # Responsibility
//! - Hold one section's content (record fields or an ordered item list).
//! - Carry editor-only state: visibility and explicit column placement.
//! - Infer placement from the first item when no explicit column is set.
//!
//! # Invariants
//! - Only the first item of a list section is consulted for placement.
//! - A placement-marker item (`{left: ...}` and nothing else) is never content.

use serde_yaml::{Mapping, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::document::{Column, LEFT_FLAG_KEY};
use super::value::{humanize_key, is_truthy, value_kind};

/// Shape errors for in-place section edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionError {
    /// The edit needs a different body shape than the section holds.
    ShapeMismatch {
        section: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Item index does not exist.
    ItemOutOfRange {
        section: String,
        index: usize,
        len: usize,
    },
}

impl Display for SectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ShapeMismatch {
                section,
                expected,
                found,
            } => write!(f, "section `{section}` holds {found}, expected {expected}"),
            Self::ItemOutOfRange {
                section,
                index,
                len,
            } => write!(
                f,
                "section `{section}` has {len} item(s); index {index} is out of range"
            ),
        }
    }
}

impl Error for SectionError {}

/// Content of one section.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    /// No content yet (`null` in the persisted form).
    Empty,
    /// Scalar fields, e.g. `name: {first, last}`.
    Record(Mapping),
    /// Ordered items: mappings, or plain strings for simple lists.
    Items(Vec<Value>),
    /// Any other scalar content, kept verbatim.
    Scalar(Value),
}

impl SectionBody {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Mapping(fields) => Self::Record(fields),
            Value::Sequence(items) => Self::Items(items),
            Value::Tagged(tagged) => Self::from_value(tagged.value),
            other => Self::Scalar(other),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Record(fields) => Value::Mapping(fields.clone()),
            Self::Items(items) => Value::Sequence(items.clone()),
            Self::Scalar(value) => value.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "nothing",
            Self::Record(_) => "a record",
            Self::Items(_) => "an item list",
            Self::Scalar(value) => value_kind(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Record(fields) => fields.is_empty(),
            Self::Items(items) => items.is_empty(),
            Self::Scalar(_) => false,
        }
    }
}

/// One editable section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Unique key in the document.
    pub name: String,
    pub body: SectionBody,
    /// Hidden sections are persisted as commented-out blocks.
    pub visible: bool,
    /// Explicit placement; `None` falls back to first-item inference.
    pub column: Option<Column>,
}

impl Section {
    /// Creates a visible section with inferred placement.
    pub fn new(name: impl Into<String>, body: SectionBody) -> Self {
        Self {
            name: name.into(),
            body,
            visible: true,
            column: None,
        }
    }

    pub fn from_value(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, SectionBody::from_value(value))
    }

    /// Display title derived from the section name.
    pub fn title(&self) -> String {
        humanize_key(&self.name)
    }

    /// Items of a list section; empty for every other shape.
    pub fn items(&self) -> &[Value] {
        match &self.body {
            SectionBody::Items(items) => items,
            _ => &[],
        }
    }

    /// Effective column: explicit placement first, then first-item inference.
    pub fn resolved_column(&self) -> Column {
        self.column
            .unwrap_or_else(|| inferred_column(self.items()))
    }

    /// Appends one item, turning an empty section into a list.
    pub fn push_item(&mut self, item: Value) -> Result<(), SectionError> {
        if matches!(self.body, SectionBody::Empty) {
            self.body = SectionBody::Items(Vec::new());
        }
        match &mut self.body {
            SectionBody::Items(items) => {
                items.push(item);
                Ok(())
            }
            other => Err(SectionError::ShapeMismatch {
                section: self.name.clone(),
                expected: "an item list",
                found: other.kind(),
            }),
        }
    }

    /// Removes and returns the item at `index`.
    pub fn remove_item(&mut self, index: usize) -> Result<Value, SectionError> {
        match &mut self.body {
            SectionBody::Items(items) if index < items.len() => Ok(items.remove(index)),
            SectionBody::Items(items) => Err(SectionError::ItemOutOfRange {
                section: self.name.clone(),
                index,
                len: items.len(),
            }),
            other => Err(SectionError::ShapeMismatch {
                section: self.name.clone(),
                expected: "an item list",
                found: other.kind(),
            }),
        }
    }

    /// Sets one field of a record section, turning an empty section into a record.
    pub fn set_field(&mut self, key: impl Into<String>, value: Value) -> Result<(), SectionError> {
        if matches!(self.body, SectionBody::Empty) {
            self.body = SectionBody::Record(Mapping::new());
        }
        match &mut self.body {
            SectionBody::Record(fields) => {
                fields.insert(Value::String(key.into()), value);
                Ok(())
            }
            other => Err(SectionError::ShapeMismatch {
                section: self.name.clone(),
                expected: "a record",
                found: other.kind(),
            }),
        }
    }
}

/// Infers placement from the first item's left flag.
///
/// Sections with no items, plain-string items, or a first item without a
/// truthy `left` flag land in the right column.
pub fn inferred_column(items: &[Value]) -> Column {
    let flagged = items
        .first()
        .and_then(Value::as_mapping)
        .and_then(|first| first.get(LEFT_FLAG_KEY))
        .is_some_and(is_truthy);
    if flagged {
        Column::Left
    } else {
        Column::Right
    }
}

/// Returns whether `item` only exists to carry the placement flag.
pub fn is_placement_marker(item: &Value) -> bool {
    item.as_mapping()
        .is_some_and(|fields| fields.len() == 1 && fields.contains_key(LEFT_FLAG_KEY))
}

#[cfg(test)]
mod tests {
    use super::{inferred_column, is_placement_marker, Section, SectionBody, SectionError};
    use crate::model::document::Column;
    use serde_yaml::Value;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).expect("test yaml should parse")
    }

    #[test]
    fn first_item_flag_decides_placement() {
        let items = yaml("[{title: Python, left: true}, {title: Go}]");
        assert_eq!(inferred_column(items.as_sequence().unwrap()), Column::Left);

        let items = yaml("[{company: Y}, {company: Z, left: true}]");
        assert_eq!(inferred_column(items.as_sequence().unwrap()), Column::Right);

        let items = yaml("[python, git]");
        assert_eq!(inferred_column(items.as_sequence().unwrap()), Column::Right);

        assert_eq!(inferred_column(&[]), Column::Right);
    }

    #[test]
    fn explicit_column_wins_over_inference() {
        let mut section = Section::from_value("skills", yaml("[{title: Python, left: true}]"));
        assert_eq!(section.resolved_column(), Column::Left);
        section.column = Some(Column::Right);
        assert_eq!(section.resolved_column(), Column::Right);
    }

    #[test]
    fn placement_marker_is_flag_only_mapping() {
        assert!(is_placement_marker(&yaml("{left: true}")));
        assert!(!is_placement_marker(&yaml("{left: true, title: x}")));
        assert!(!is_placement_marker(&yaml("left")));
    }

    #[test]
    fn empty_section_becomes_list_on_push() {
        let mut section = Section::new("awards", SectionBody::Empty);
        section.push_item(yaml("{title: Prize}")).unwrap();
        assert_eq!(section.items().len(), 1);

        let removed = section.remove_item(0).unwrap();
        assert_eq!(removed, yaml("{title: Prize}"));
        let error = section.remove_item(0).expect_err("list is now empty");
        assert!(matches!(error, SectionError::ItemOutOfRange { len: 0, .. }));
    }

    #[test]
    fn record_edits_reject_list_sections() {
        let mut section = Section::from_value("skills", yaml("[a]"));
        let error = section
            .set_field("first", Value::from("A"))
            .expect_err("list section is not a record");
        assert!(error.to_string().contains("expected a record"));

        let mut name = Section::new("name", SectionBody::Empty);
        name.set_field("first", Value::from("Ada")).unwrap();
        assert_eq!(name.body.to_value(), yaml("{first: Ada}"));
    }

    #[test]
    fn title_is_humanized_name() {
        assert_eq!(Section::new("work_experience", SectionBody::Empty).title(), "Work Experience");
    }
}
