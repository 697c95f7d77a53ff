//! Attribute-driven item formatting.
//!
//! # Responsibility
//! - Declare which item attributes play which role (`AttributeTable`).
//! - Format one item mapping into blocks from the attributes it carries.
//! - Process the polymorphic content field: paragraph, bullet list, or
//!   nested sub-items.
//!
//! # Invariants
//! - Within a role, the first present key wins; a blank value there renders
//!   nothing for that role and later keys are not consulted.
//! - At most one content key is rendered per item.
//! - Metadata always renders in table order, not source key order.

use serde_yaml::{Mapping, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

use super::block::{Block, ListStyle};
use super::escape::{escape_text, href, render_text};
use crate::model::value::{humanize_key, is_blank, scalar_text, value_kind};

const BULLET_MARKER: &str = "- ";
const METADATA_SEPARATOR: &str = " ~|~ ";
const NESTED_ITEM_WIDTH: &str = r"\linewidth";

/// One recognized metadata attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataKey {
    pub key: &'static str,
    /// Literal markup placed before the value.
    pub prefix: &'static str,
    /// Value is a link target rendered with the table's link text.
    pub link: bool,
}

/// Role table consulted by the item formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeTable {
    pub primary_title: &'static [&'static str],
    pub secondary_title: &'static [&'static str],
    pub metadata: &'static [MetadataKey],
    /// Companion key holding display text for link metadata.
    pub link_text_key: &'static str,
    pub default_link_text: &'static str,
    pub content: &'static [&'static str],
    pub tag_lists: &'static [&'static str],
}

pub const DEFAULT_ATTRIBUTES: AttributeTable = AttributeTable {
    primary_title: &["position", "degree", "title", "project", "name"],
    secondary_title: &["company", "institution", "issuer"],
    metadata: &[
        MetadataKey { key: "dates", prefix: "", link: false },
        MetadataKey { key: "location", prefix: "", link: false },
        MetadataKey { key: "url", prefix: "", link: true },
        MetadataKey { key: "pull_request", prefix: "PR: ", link: false },
    ],
    link_text_key: "url_href",
    default_link_text: "Link",
    content: &["description", "contribution", "details"],
    tag_lists: &["technologies", "skills_used", "tools"],
};

/// Item whose recognized attributes have an unusable shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    InvalidShape {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl ItemError {
    fn invalid_shape(key: impl Into<String>, expected: &'static str, value: &Value) -> Self {
        Self::InvalidShape {
            key: key.into(),
            expected,
            found: value_kind(value),
        }
    }
}

impl Display for ItemError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidShape {
                key,
                expected,
                found,
            } => write!(f, "attribute `{key}` must be {expected}, found {found}"),
        }
    }
}

impl Error for ItemError {}

/// Formats items according to an `AttributeTable`.
#[derive(Debug, Clone, Copy)]
pub struct ItemFormatter<'t> {
    table: &'t AttributeTable,
}

impl<'t> ItemFormatter<'t> {
    pub fn new(table: &'t AttributeTable) -> Self {
        Self { table }
    }

    /// Formats a top-level item into one self-contained block sequence.
    pub fn format(&self, item: &Mapping) -> Result<Vec<Block>, ItemError> {
        self.format_item(item, false)
    }

    fn format_item(&self, item: &Mapping, nested: bool) -> Result<Vec<Block>, ItemError> {
        let mut blocks = Vec::new();

        let primary = first_text(item, self.table.primary_title)?;
        let secondary = first_text(item, self.table.secondary_title)?;
        if let Some(primary) = &primary {
            blocks.push(Block::command("runsubsection", render_text(primary)));
        }
        match &secondary {
            Some(secondary) => {
                if primary.is_some() {
                    blocks.push(Block::LineBreak);
                }
                blocks.push(Block::command("descript", render_text(secondary)));
            }
            None if !nested => blocks.push(Block::LineBreak),
            None => {}
        }

        if let Some(line) = self.metadata_line(item)? {
            blocks.push(Block::command("location", line));
        }

        let mut content_rendered = false;
        if let Some((key, value)) = first_present(item, self.table.content)
            .filter(|(_, value)| !is_blank(value))
        {
            let content = self.format_content(key, value)?;
            content_rendered = !content.is_empty();
            blocks.extend(content);
        }

        for key in self.table.tag_lists {
            let Some(Value::Sequence(values)) = item.get(*key) else {
                continue;
            };
            if values.is_empty() {
                continue;
            }
            let mut tags = Vec::with_capacity(values.len());
            for value in values {
                let tag = scalar_text(value)
                    .ok_or_else(|| ItemError::invalid_shape(*key, "a list of text", value))?;
                tags.push(tag);
            }
            if content_rendered {
                blocks.push(Block::LineBreak);
            }
            blocks.push(Block::Text(format!(
                "\\textbf{{{}:}} {}",
                escape_text(&humanize_key(key)),
                render_text(&tags.join(", "))
            )));
        }

        if !nested {
            blocks.push(Block::LineBreak);
        }
        Ok(blocks)
    }

    fn metadata_line(&self, item: &Mapping) -> Result<Option<String>, ItemError> {
        let mut parts = Vec::new();
        for meta in self.table.metadata {
            let Some(value) = item.get(meta.key) else {
                continue;
            };
            if is_blank(value) {
                continue;
            }
            let text = scalar_text(value)
                .ok_or_else(|| ItemError::invalid_shape(meta.key, "text", value))?;
            if meta.link {
                let display = first_text(item, &[self.table.link_text_key])?
                    .unwrap_or_else(|| self.table.default_link_text.to_string());
                parts.push(format!("{}{}", meta.prefix, href(text.trim(), &escape_text(&display))));
            } else {
                parts.push(format!("{}{}", meta.prefix, render_text(&text)));
            }
        }
        if parts.is_empty() {
            Ok(None)
        } else {
            Ok(Some(parts.join(METADATA_SEPARATOR)))
        }
    }

    /// Processes one content value: text, bullet text, or nested items.
    ///
    /// Empty text and empty sequences render nothing.
    pub fn format_content(&self, key: &str, value: &Value) -> Result<Vec<Block>, ItemError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::String(text) => Ok(format_text_content(text)),
            Value::Number(_) | Value::Bool(_) => {
                Ok(format_text_content(&scalar_text(value).unwrap_or_default()))
            }
            Value::Sequence(items) => {
                if items.is_empty() {
                    return Ok(Vec::new());
                }
                let mut entries = Vec::with_capacity(items.len());
                for (index, sub_item) in items.iter().enumerate() {
                    let Some(fields) = sub_item.as_mapping() else {
                        return Err(ItemError::invalid_shape(
                            format!("{key}[{index}]"),
                            "a mapping",
                            sub_item,
                        ));
                    };
                    entries.push(vec![Block::MiniPage {
                        width: NESTED_ITEM_WIDTH.to_string(),
                        body: self.format_item(fields, true)?,
                    }]);
                }
                Ok(vec![Block::List {
                    style: ListStyle::Dash,
                    entries,
                }])
            }
            Value::Tagged(tagged) => self.format_content(key, &tagged.value),
            Value::Mapping(_) => Err(ItemError::invalid_shape(
                key,
                "text or a list of items",
                value,
            )),
        }
    }
}

/// Text content: a bullet list when any line starts with `- `, else a paragraph.
fn format_text_content(text: &str) -> Vec<Block> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let Some((lead, bullets)) = group_bullets(trimmed) else {
        return vec![Block::Text(render_text(trimmed))];
    };

    let mut blocks = Vec::with_capacity(2);
    if !lead.is_empty() {
        blocks.push(Block::Text(render_text(&lead)));
    }
    blocks.push(Block::List {
        style: ListStyle::Bullet,
        entries: bullets
            .iter()
            .map(|bullet| vec![Block::Text(render_text(bullet))])
            .collect(),
    });
    blocks
}

/// Groups bullet text; returns `None` when no line carries the marker.
///
/// A marker line starts a new bullet and following non-marker lines are
/// appended to it with a single space. Lines before the first marker are
/// returned as lead text. Blank lines are ignored.
pub(crate) fn group_bullets(text: &str) -> Option<(String, Vec<String>)> {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    if !lines.iter().any(|line| line.starts_with(BULLET_MARKER)) {
        return None;
    }

    let mut lead: Vec<&str> = Vec::new();
    let mut bullets: Vec<Vec<&str>> = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix(BULLET_MARKER) {
            bullets.push(vec![rest.trim()]);
        } else if let Some(current) = bullets.last_mut() {
            current.push(line);
        } else {
            lead.push(line);
        }
    }
    Some((
        lead.join(" "),
        bullets.into_iter().map(|parts| parts.join(" ")).collect(),
    ))
}

/// Text of the first present key; `None` when absent or blank.
fn first_text(item: &Mapping, keys: &[&str]) -> Result<Option<String>, ItemError> {
    let Some((key, value)) = first_present(item, keys) else {
        return Ok(None);
    };
    if is_blank(value) {
        return Ok(None);
    }
    scalar_text(value)
        .map(Some)
        .ok_or_else(|| ItemError::invalid_shape(key, "text", value))
}

fn first_present<'i, 'k>(item: &'i Mapping, keys: &[&'k str]) -> Option<(&'k str, &'i Value)> {
    keys.iter()
        .find_map(|key| item.get(*key).map(|value| (*key, value)))
}
