//! Editor session: orderer + autosave + compile worker.
//!
//! # Responsibility
//! - Route every UI mutation through the orderer and then the autosave listener.
//! - Run explicit save-and-compile requests.
//! - Render previews from in-memory state.
//!
//! # Invariants
//! - In-memory state stays authoritative when a persist fails.
//! - A compile always reads a document saved by this session first.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use super::autosave::{AutosaveListener, PersistDecision};
use super::compile_service::{CompileService, CompileServiceError};
use super::section_service::{OrderError, SectionChange, SectionOrderer};
use crate::compiler::{CompileOutcome, CompilePipeline, CompileRequest, LatexTypesetter};
use crate::config::WorkspaceConfig;
use crate::markup::{MarkupError, MarkupGenerator};
use crate::model::document::Column;
use crate::model::section::{Section, SectionBody};
use crate::repo::{DocumentRepository, FileDocumentRepository, RepoError};

#[derive(Debug)]
pub enum SessionError {
    Repo(RepoError),
    Order(OrderError),
    Compile(CompileServiceError),
    Markup(MarkupError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Order(err) => write!(f, "{err}"),
            Self::Compile(err) => write!(f, "{err}"),
            Self::Markup(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Order(err) => Some(err),
            Self::Compile(err) => Some(err),
            Self::Markup(err) => Some(err),
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<OrderError> for SessionError {
    fn from(value: OrderError) -> Self {
        Self::Order(value)
    }
}

impl From<CompileServiceError> for SessionError {
    fn from(value: CompileServiceError) -> Self {
        Self::Compile(value)
    }
}

impl From<MarkupError> for SessionError {
    fn from(value: MarkupError) -> Self {
        Self::Markup(value)
    }
}

/// One open résumé workspace.
pub struct EditorSession<R: DocumentRepository> {
    orderer: SectionOrderer,
    autosave: AutosaveListener<R>,
    compiler: CompileService,
    document_path: PathBuf,
    output_name: String,
    fallback_template: String,
}

impl EditorSession<FileDocumentRepository> {
    /// Opens the workspace described by `config`, recovering hidden sections.
    pub fn open(config: &WorkspaceConfig) -> Result<Self, SessionError> {
        let repo = FileDocumentRepository::new(&config.document_path);
        let pipeline = CompilePipeline::new(
            config.pipeline_settings(),
            Box::new(LatexTypesetter::new(config.engine.as_str())),
        );
        Self::with_parts(
            repo,
            &config.document_path,
            config.output_name.as_str(),
            pipeline,
        )
    }
}

impl<R: DocumentRepository> EditorSession<R> {
    /// Builds a session from explicit parts.
    ///
    /// `document_path` is where `repo` persists; the compile pipeline reads it.
    pub fn with_parts(
        repo: R,
        document_path: impl AsRef<Path>,
        output_name: impl Into<String>,
        pipeline: CompilePipeline,
    ) -> Result<Self, SessionError> {
        let loaded = repo.load_workspace()?;
        let orderer = SectionOrderer::from_loaded(loaded);
        let fallback_template = pipeline.settings().default_template.clone();
        info!(
            "event=session_open module=service status=ok sections={}",
            orderer.len()
        );
        Ok(Self {
            orderer,
            autosave: AutosaveListener::new(repo),
            compiler: CompileService::new(pipeline),
            document_path: document_path.as_ref().to_path_buf(),
            output_name: output_name.into(),
            fallback_template,
        })
    }

    pub fn orderer(&self) -> &SectionOrderer {
        &self.orderer
    }

    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    pub fn last_persist_error(&self) -> Option<&str> {
        self.autosave.last_error()
    }

    /// Applies one mutation and lets the autosave listener react to it.
    ///
    /// # Errors
    /// - `Order` when the mutation is rejected; nothing changes.
    /// - `Repo` when persisting fails; the mutation stays applied in memory.
    pub fn apply<F>(&mut self, mutation: F) -> Result<SectionChange, SessionError>
    where
        F: FnOnce(&mut SectionOrderer) -> Result<SectionChange, OrderError>,
    {
        let change = mutation(&mut self.orderer)?;
        let decision = self.autosave.on_change(&self.orderer, &change)?;
        if decision == PersistDecision::Deferred {
            info!("event=session_edit module=service status=deferred");
        }
        Ok(change)
    }

    pub fn insert(
        &mut self,
        section: Section,
        index: Option<usize>,
    ) -> Result<SectionChange, SessionError> {
        self.apply(|orderer| orderer.insert(section, index))
    }

    pub fn reorder(&mut self, name: &str, new_index: usize) -> Result<SectionChange, SessionError> {
        self.apply(|orderer| orderer.reorder(name, new_index))
    }

    pub fn remove(&mut self, name: &str) -> Result<SectionChange, SessionError> {
        self.apply(|orderer| orderer.remove(name))
    }

    pub fn set_visible(&mut self, name: &str, visible: bool) -> Result<SectionChange, SessionError> {
        self.apply(|orderer| orderer.set_visible(name, visible))
    }

    pub fn set_column(
        &mut self,
        name: &str,
        column: Option<Column>,
    ) -> Result<SectionChange, SessionError> {
        self.apply(|orderer| orderer.set_column(name, column))
    }

    pub fn replace_body(
        &mut self,
        name: &str,
        body: SectionBody,
    ) -> Result<SectionChange, SessionError> {
        self.apply(|orderer| orderer.replace_body(name, body))
    }

    /// Explicit save of the full in-memory state.
    pub fn save(&mut self) -> Result<(), SessionError> {
        self.autosave.autosave_persist(&self.orderer)?;
        Ok(())
    }

    /// Saves, then starts a compile on the worker thread.
    ///
    /// A `template` choice is stored in the document before saving.
    ///
    /// # Errors
    /// - `Compile(Busy)` while a previous compile runs; nothing is written.
    /// - `Repo` when saving fails; no compile is started.
    pub fn save_and_compile(&mut self, template: Option<String>) -> Result<Uuid, SessionError> {
        if self.compiler.is_busy() {
            return Err(SessionError::Compile(CompileServiceError::Busy));
        }
        if template.is_some() {
            self.orderer.set_template(template.clone());
        }
        self.save()?;
        let request = CompileRequest::new(&self.document_path, self.output_name.as_str())
            .with_template(template);
        Ok(self.compiler.submit(request)?)
    }

    /// Drains finished compile outcomes without blocking.
    pub fn poll_compile(&self) -> Vec<CompileOutcome> {
        std::iter::from_fn(|| self.compiler.try_next()).collect()
    }

    /// Waits up to `timeout` for the next finished compile.
    pub fn wait_compile(&self, timeout: Duration) -> Option<CompileOutcome> {
        self.compiler.wait_next(timeout)
    }

    pub fn is_compiling(&self) -> bool {
        self.compiler.is_busy()
    }

    /// Generated markup for the in-memory state; hidden sections are excluded.
    pub fn preview(&self) -> Result<String, SessionError> {
        let markup = MarkupGenerator::new(self.fallback_template.as_str())
            .generate(&self.orderer.to_document())?;
        Ok(markup.to_latex())
    }
}
