//! Core domain logic for the résumé builder.
//! This crate is the single source of truth for document, ordering and
//! rendering rules; the CLI and FFI crates only adapt it.

pub mod compiler;
pub mod config;
pub mod logging;
pub mod markup;
pub mod model;
pub mod repo;
pub mod service;

pub use compiler::{
    CompileOutcome, CompilePipeline, CompileRequest, LatexTypesetter, PipelineError,
    PipelineSettings, Typesetter,
};
pub use config::{ConfigError, WorkspaceConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use markup::{Markup, MarkupError, MarkupGenerator};
pub use model::document::{Column, Document, DocumentError};
pub use model::section::{Section, SectionBody, SectionError};
pub use repo::{DocumentRepository, FileDocumentRepository, LoadedDocument, RepoError, RepoResult};
pub use service::autosave::{AutosaveListener, PersistDecision};
pub use service::compile_service::{CompileService, CompileServiceError};
pub use service::editor_service::{EditorSession, SessionError};
pub use service::section_service::{OrderError, SectionChange, SectionOrderer};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
