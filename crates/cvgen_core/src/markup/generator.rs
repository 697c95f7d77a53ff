//! Document-to-markup generator.
//!
//! # Responsibility
//! - Resolve section order and column placement.
//! - Dispatch each section's items to the item formatter.
//! - Assemble the final LaTeX text around the header and both columns.
//!
//! # Invariants
//! - Header first, then left-column sections, then right-column sections.
//! - Relative section order inside each column equals the resolved order.
//! - A failing item aborts the run with its section name attached.

use log::{error, info, warn};
use serde_yaml::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Instant;

use super::block::{render_blocks, Block};
use super::escape::{escape_text, render_text};
use super::header::header_block;
use super::item::{AttributeTable, ItemError, ItemFormatter, DEFAULT_ATTRIBUTES};
use crate::model::document::{Column, Document};
use crate::model::section::{inferred_column, is_placement_marker};
use crate::model::value::{humanize_key, scalar_text, value_kind};

const FALLBACK_CLASS_NAME: &str = "template";
const PACKAGES: [&str; 4] = ["enumitem", "fancyhdr", "hyperref", "fontawesome"];
const LEFT_COLUMN_WIDTH: &str = r"0.33\textwidth";
const RIGHT_COLUMN_WIDTH: &str = r"0.66\textwidth";

pub type MarkupResult<T> = Result<T, MarkupError>;

/// Markup generation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    /// A section could not be rendered.
    Section { section: String, source: ItemError },
}

impl MarkupError {
    pub fn section(&self) -> &str {
        match self {
            Self::Section { section, .. } => section,
        }
    }
}

impl Display for MarkupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Section { section, source } => {
                write!(f, "section `{section}` cannot be rendered: {source}")
            }
        }
    }
}

impl Error for MarkupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Section { source, .. } => Some(source),
        }
    }
}

/// One rendered body section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarkup {
    pub name: String,
    /// Escaped display title.
    pub title: String,
    pub body: Vec<Block>,
}

impl SectionMarkup {
    fn render(&self, out: &mut String) {
        Block::command("section", self.title.as_str()).render(out);
        render_blocks(&self.body, out);
    }
}

/// Generated document, split by output position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup {
    /// Style directive (template base name).
    pub class_name: String,
    pub header: Block,
    pub left: Vec<SectionMarkup>,
    pub right: Vec<SectionMarkup>,
}

impl Markup {
    /// Section names in emission order: left column, then right column.
    pub fn section_names(&self) -> Vec<&str> {
        self.left
            .iter()
            .chain(&self.right)
            .map(|section| section.name.as_str())
            .collect()
    }

    /// Renders the complete LaTeX source.
    pub fn to_latex(&self) -> String {
        let mut out = String::new();
        Block::command("documentclass", self.class_name.as_str()).render(&mut out);
        for package in PACKAGES {
            Block::command("usepackage", package).render(&mut out);
        }
        Block::command("pagestyle", "fancy").render(&mut out);
        out.push_str("\\fancyhf{}\n");
        out.push_str("\\begin{document}\n");
        self.header.render(&mut out);

        render_column(LEFT_COLUMN_WIDTH, &self.left, &mut out);
        out.push_str("\\hfill\n");
        render_column(RIGHT_COLUMN_WIDTH, &self.right, &mut out);

        out.push_str("\\end{document}\n");
        out
    }
}

fn render_column(width: &str, sections: &[SectionMarkup], out: &mut String) {
    out.push_str("\\begin{minipage}[t]{");
    out.push_str(width);
    out.push_str("}\n");
    for section in sections {
        section.render(out);
    }
    out.push_str("\\end{minipage}\n");
}

/// Style directive for a template reference: base name, extension stripped.
pub fn class_name(template: &str) -> String {
    Path::new(template.trim())
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(FALLBACK_CLASS_NAME)
        .to_string()
}

/// Attribute-driven markup generator.
#[derive(Debug, Clone)]
pub struct MarkupGenerator {
    table: &'static AttributeTable,
    fallback_template: String,
}

impl MarkupGenerator {
    /// Creates a generator with the built-in attribute table.
    ///
    /// `fallback_template` is used when the document names no template.
    pub fn new(fallback_template: impl Into<String>) -> Self {
        Self::with_attributes(&DEFAULT_ATTRIBUTES, fallback_template)
    }

    pub fn with_attributes(
        table: &'static AttributeTable,
        fallback_template: impl Into<String>,
    ) -> Self {
        Self {
            table,
            fallback_template: fallback_template.into(),
        }
    }

    /// Generates markup for `document`.
    ///
    /// # Errors
    /// - `MarkupError::Section` when an item in a section has an unusable shape.
    pub fn generate(&self, document: &Document) -> MarkupResult<Markup> {
        let started_at = Instant::now();
        let template = document
            .template()
            .unwrap_or(self.fallback_template.as_str());
        let mut markup = Markup {
            class_name: class_name(template),
            header: header_block(document),
            left: Vec::new(),
            right: Vec::new(),
        };

        for name in document.ordered_section_names() {
            let Some(Value::Sequence(items)) = document.get(&name) else {
                continue;
            };
            if items.is_empty() {
                continue;
            }
            let column = document
                .column_override(&name)
                .unwrap_or_else(|| inferred_column(items));

            let body = match self.section_body(items) {
                Ok(body) => body,
                Err(source) => {
                    error!(
                        "event=markup_generate module=markup status=error section={} error_code=invalid_item",
                        name
                    );
                    return Err(MarkupError::Section {
                        section: name,
                        source,
                    });
                }
            };
            let Some(body) = body else {
                continue;
            };

            let section = SectionMarkup {
                title: escape_text(&humanize_key(&name)),
                name,
                body,
            };
            match column {
                Column::Left => markup.left.push(section),
                Column::Right => markup.right.push(section),
            }
        }

        info!(
            "event=markup_generate module=markup status=ok class={} left={} right={} duration_ms={}",
            markup.class_name,
            markup.left.len(),
            markup.right.len(),
            started_at.elapsed().as_millis()
        );
        Ok(markup)
    }

    /// Renders one section body; `None` when nothing but markers remain.
    fn section_body(&self, items: &[Value]) -> Result<Option<Vec<Block>>, ItemError> {
        let content: Vec<&Value> = items
            .iter()
            .filter(|item| !is_placement_marker(item))
            .collect();
        if content.is_empty() {
            return Ok(None);
        }

        if content.iter().all(|item| !item.is_mapping()) {
            let mut words = Vec::with_capacity(content.len());
            for (index, item) in content.iter().enumerate() {
                if item.is_null() {
                    continue;
                }
                let text = scalar_text(item).ok_or_else(|| ItemError::InvalidShape {
                    key: format!("[{index}]"),
                    expected: "text",
                    found: value_kind(item),
                })?;
                words.push(render_text(&text));
            }
            if words.is_empty() {
                return Ok(None);
            }
            return Ok(Some(vec![Block::Text(words.join(" "))]));
        }

        let formatter = ItemFormatter::new(self.table);
        let mut body = Vec::new();
        for (index, item) in content.iter().enumerate() {
            match item {
                Value::Mapping(fields) => body.extend(formatter.format(fields)?),
                Value::Null => {}
                Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                    warn!(
                        "event=markup_generate module=markup status=skip item_index={} reason=scalar_in_record_section",
                        index
                    );
                }
                other => {
                    return Err(ItemError::InvalidShape {
                        key: format!("[{index}]"),
                        expected: "a mapping",
                        found: value_kind(other),
                    });
                }
            }
        }
        Ok(Some(body))
    }
}
