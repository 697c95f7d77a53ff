//! Section ordering, visibility and persisted-form rendering.
//!
//! # Responsibility
//! - Own the canonical section order and per-section visibility/placement.
//! - Apply editor mutations and report each as a `SectionChange` event.
//! - Regenerate the persisted text form from scratch, hidden sections
//!   commented out line by line.
//!
//! # Invariants
//! - Every known section name appears in the order exactly once.
//! - Reorder is remove + reinsert; no section data is lost.
//! - Removing a section discards its data and its order entry.
//! - Mutations never perform I/O; persistence is the listener's decision.

use log::{debug, info};
use serde_yaml::{Mapping, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::document::{
    is_meta_key, Column, Document, DocumentError, COLUMNS_KEY, ORDER_KEY, TEMPLATE_KEY,
};
use crate::model::section::{Section, SectionBody, SectionError};
use crate::repo::{LoadedDocument, COMMENT_MARKER};

/// State transition produced by one orderer mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionChange {
    Inserted { name: String, index: usize },
    Reordered { name: String, from: usize, to: usize },
    Removed { name: String },
    VisibilityChanged { name: String, visible: bool },
    ColumnChanged { name: String, column: Option<Column> },
    TemplateChanged { template: Option<String> },
    /// Section content edited in place.
    BodyEdited { name: String },
    /// Mutation was a no-op.
    Unchanged,
}

impl SectionChange {
    /// Structural and settings changes are persisted immediately; content
    /// edits wait for an explicit save.
    pub fn requires_autosave(&self) -> bool {
        !matches!(self, Self::BodyEdited { .. } | Self::Unchanged)
    }
}

/// Orderer mutation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    UnknownSection(String),
    DuplicateSection(String),
    /// Name is a document-level setting key.
    ReservedName(String),
    IndexOutOfRange { index: usize, len: usize },
    Shape(SectionError),
}

impl Display for OrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSection(name) => write!(f, "unknown section `{name}`"),
            Self::DuplicateSection(name) => write!(f, "section `{name}` already exists"),
            Self::ReservedName(name) => write!(f, "`{name}` is reserved and cannot be a section"),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} is out of range for {len} section(s)")
            }
            Self::Shape(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Shape(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SectionError> for OrderError {
    fn from(value: SectionError) -> Self {
        Self::Shape(value)
    }
}

/// Ordered, editable set of sections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionOrderer {
    sections: Vec<Section>,
    template: Option<String>,
}

impl SectionOrderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the orderer from a document with no hidden sections.
    pub fn from_document(document: Document) -> Self {
        Self::from_loaded(LoadedDocument {
            document,
            hidden: Vec::new(),
        })
    }

    /// Builds the orderer from a loaded workspace.
    ///
    /// Names listed in `_order` come first, then visible sections in
    /// document order, then hidden sections in file order.
    pub fn from_loaded(loaded: LoadedDocument) -> Self {
        let LoadedDocument { document, hidden } = loaded;
        let order = document.order().unwrap_or_default();
        let template = document.template().map(str::to_string);

        let mut pool: Vec<Section> = Vec::new();
        for (name, value) in document.entries() {
            if is_meta_key(name) || pool.iter().any(|section| section.name == name) {
                continue;
            }
            let mut section = Section::from_value(name, value.clone());
            section.column = document.column_override(name);
            pool.push(section);
        }
        for entry in hidden {
            if is_meta_key(&entry.name) || pool.iter().any(|section| section.name == entry.name) {
                continue;
            }
            let mut section = Section::from_value(entry.name.as_str(), entry.value);
            section.visible = false;
            section.column = document.column_override(&entry.name);
            pool.push(section);
        }

        let mut sections = Vec::with_capacity(pool.len());
        for name in &order {
            if let Some(position) = pool.iter().position(|section| &section.name == name) {
                sections.push(pool.remove(position));
            }
        }
        sections.append(&mut pool);

        debug!(
            "event=section_load module=service status=ok sections={} hidden={}",
            sections.len(),
            sections.iter().filter(|section| !section.visible).count()
        );
        Self { sections, template }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Current order, hidden sections included.
    pub fn order(&self) -> Vec<&str> {
        self.sections.iter().map(|section| section.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Inserts a new section at `index`, or at the end when `None`.
    pub fn insert(
        &mut self,
        section: Section,
        index: Option<usize>,
    ) -> Result<SectionChange, OrderError> {
        if is_meta_key(&section.name) {
            return Err(OrderError::ReservedName(section.name));
        }
        if self.get(&section.name).is_some() {
            return Err(OrderError::DuplicateSection(section.name));
        }
        let len = self.sections.len();
        let index = index.unwrap_or(len);
        if index > len {
            return Err(OrderError::IndexOutOfRange { index, len });
        }
        let name = section.name.clone();
        self.sections.insert(index, section);
        Ok(SectionChange::Inserted { name, index })
    }

    /// Moves `name` to `new_index`; indexes past the end move it last.
    pub fn reorder(&mut self, name: &str, new_index: usize) -> Result<SectionChange, OrderError> {
        let from = self.position(name)?;
        let to = new_index.min(self.sections.len() - 1);
        if from == to {
            return Ok(SectionChange::Unchanged);
        }
        let section = self.sections.remove(from);
        self.sections.insert(to, section);
        info!(
            "event=section_reorder module=service status=ok from={} to={}",
            from, to
        );
        Ok(SectionChange::Reordered {
            name: name.to_string(),
            from,
            to,
        })
    }

    /// Removes `name` and discards its data.
    pub fn remove(&mut self, name: &str) -> Result<SectionChange, OrderError> {
        let position = self.position(name)?;
        let removed = self.sections.remove(position);
        Ok(SectionChange::Removed { name: removed.name })
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<SectionChange, OrderError> {
        let section = self.section_mut(name)?;
        if section.visible == visible {
            return Ok(SectionChange::Unchanged);
        }
        section.visible = visible;
        Ok(SectionChange::VisibilityChanged {
            name: name.to_string(),
            visible,
        })
    }

    /// Sets explicit placement; `None` returns to first-item inference.
    pub fn set_column(
        &mut self,
        name: &str,
        column: Option<Column>,
    ) -> Result<SectionChange, OrderError> {
        let section = self.section_mut(name)?;
        if section.column == column {
            return Ok(SectionChange::Unchanged);
        }
        section.column = column;
        Ok(SectionChange::ColumnChanged {
            name: name.to_string(),
            column,
        })
    }

    /// Sets the template reference; blank clears it.
    pub fn set_template(&mut self, template: Option<String>) -> SectionChange {
        let template = template
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        if self.template == template {
            return SectionChange::Unchanged;
        }
        self.template = template.clone();
        SectionChange::TemplateChanged { template }
    }

    pub fn replace_body(
        &mut self,
        name: &str,
        body: SectionBody,
    ) -> Result<SectionChange, OrderError> {
        let section = self.section_mut(name)?;
        section.body = body;
        Ok(SectionChange::BodyEdited {
            name: name.to_string(),
        })
    }

    /// Edits a section in place, e.g. `|s| s.push_item(item)`.
    pub fn edit_body<F>(&mut self, name: &str, edit: F) -> Result<SectionChange, OrderError>
    where
        F: FnOnce(&mut Section) -> Result<(), SectionError>,
    {
        let section = self.section_mut(name)?;
        edit(section)?;
        Ok(SectionChange::BodyEdited {
            name: name.to_string(),
        })
    }

    /// Document view of visible state, hidden sections excluded.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(ORDER_KEY, self.order_value());
        if let Some(template) = &self.template {
            document.insert(TEMPLATE_KEY, Value::String(template.clone()));
        }
        let columns = self.columns_value();
        if !columns.is_empty() {
            document.insert(COLUMNS_KEY, Value::Mapping(columns));
        }
        for section in self.sections.iter().filter(|section| section.visible) {
            document.insert(section.name.as_str(), section.body.to_value());
        }
        document
    }

    /// Renders the complete persisted text form.
    ///
    /// The order list comes first, then the template and explicit placements,
    /// then one block per section in order. Hidden blocks have every line
    /// prefixed with `COMMENT_MARKER` so a normal parse ignores them.
    pub fn render_persisted(&self) -> Result<String, DocumentError> {
        let mut blocks = vec![yaml_block(ORDER_KEY, self.order_value())?];
        if let Some(template) = &self.template {
            blocks.push(yaml_block(TEMPLATE_KEY, Value::String(template.clone()))?);
        }
        let columns = self.columns_value();
        if !columns.is_empty() {
            blocks.push(yaml_block(COLUMNS_KEY, Value::Mapping(columns))?);
        }
        for section in &self.sections {
            let block = yaml_block(&section.name, section.body.to_value())?;
            if section.visible {
                blocks.push(block);
            } else {
                blocks.push(comment_out(&block));
            }
        }
        let mut text = blocks.join("\n\n");
        text.push('\n');
        Ok(text)
    }

    fn order_value(&self) -> Value {
        Value::Sequence(
            self.sections
                .iter()
                .map(|section| Value::String(section.name.clone()))
                .collect(),
        )
    }

    fn columns_value(&self) -> Mapping {
        let mut columns = Mapping::new();
        for section in &self.sections {
            if let Some(column) = section.column {
                columns.insert(
                    Value::String(section.name.clone()),
                    Value::String(column.as_str().to_string()),
                );
            }
        }
        columns
    }

    fn position(&self, name: &str) -> Result<usize, OrderError> {
        self.sections
            .iter()
            .position(|section| section.name == name)
            .ok_or_else(|| OrderError::UnknownSection(name.to_string()))
    }

    fn section_mut(&mut self, name: &str) -> Result<&mut Section, OrderError> {
        self.sections
            .iter_mut()
            .find(|section| section.name == name)
            .ok_or_else(|| OrderError::UnknownSection(name.to_string()))
    }
}

fn yaml_block(key: &str, value: Value) -> Result<String, DocumentError> {
    let mut entry = Mapping::new();
    entry.insert(Value::String(key.to_string()), value);
    let text = serde_yaml::to_string(&entry).map_err(DocumentError::Serialize)?;
    Ok(text.trim_end().to_string())
}

fn comment_out(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            if line.is_empty() {
                COMMENT_MARKER.trim_end().to_string()
            } else {
                format!("{COMMENT_MARKER}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
