//! Résumé domain model.
//!
//! # Responsibility
//! - Define the persisted document shape and its reserved keys.
//! - Define the editable per-section representation used by the editor.
//!
//! # Invariants
//! - Top-level key order is preserved exactly as parsed or inserted.
//! - Section placement is explicit when set, inferred from the first item otherwise.

pub mod document;
pub mod section;
pub mod value;
