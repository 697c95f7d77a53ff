//! Attribute-driven document-to-markup transformation.
//!
//! # Responsibility
//! - Turn a résumé `Document` into an ordered tree of typeset blocks:
//!   preamble and header, then left-column sections, then right-column sections.
//! - Format each item by the attributes it carries, never by the section it
//!   lives in.
//! - Escape every free-text value exactly once before markup is inserted.
//!
//! # Invariants
//! - Output is a pure function of the input document and fallback template;
//!   repeated runs produce byte-identical text.
//! - A malformed item fails the whole run with the owning section name attached.

pub mod block;
pub mod escape;
pub mod generator;
pub mod header;
pub mod item;

pub use block::{render_blocks, Block, ListStyle};
pub use escape::{escape_text, escape_url, href, render_text};
pub use generator::{class_name, Markup, MarkupError, MarkupGenerator, MarkupResult, SectionMarkup};
pub use item::{AttributeTable, ItemError, ItemFormatter, MetadataKey, DEFAULT_ATTRIBUTES};
