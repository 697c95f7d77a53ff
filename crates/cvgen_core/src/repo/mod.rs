//! Document store contracts and file-backed implementation.
//!
//! # Responsibility
//! - Define the load/save contract for the persisted résumé document.
//! - Keep file-system details out of services and the markup generator.
//!
//! # Invariants
//! - Writes are write-new-then-replace; a reader never sees a half-written file.
//! - Saved text must parse back before it replaces the previous file.
//! - Hidden sections are commented out with `COMMENT_MARKER` on every line.

mod atomic;
pub mod document_repo;

pub use atomic::write_atomic;
pub use document_repo::{
    recover_hidden_sections, DocumentRepository, FileDocumentRepository, HiddenSection,
    LoadedDocument, RepoError, RepoResult, COMMENT_MARKER,
};
