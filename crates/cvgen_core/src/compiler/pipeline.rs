//! Compile pipeline: load, generate, stage, typeset.
//!
//! # Responsibility
//! - Run one compile end to end and report a `(success, message)` outcome.
//! - Fail before typesetting when the style file cannot be resolved or staged.
//!
//! # Invariants
//! - The staging directory is cleared before every run.
//! - No step runs after the first failing step.
//! - The document file is only read, never written.

use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

use super::staging::{resolve_template, StagingArea};
use super::typesetter::{TypesetError, TypesetJob, Typesetter};
use crate::markup::{MarkupError, MarkupGenerator};
use crate::repo::{DocumentRepository, FileDocumentRepository, RepoError};

pub const SUCCESS_MESSAGE: &str = "Build pipeline completed";
const DEFAULT_JOB_NAME: &str = "resume";

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Compile pipeline error.
#[derive(Debug)]
pub enum PipelineError {
    /// Document missing, unreadable or malformed.
    Input(RepoError),
    Markup(MarkupError),
    /// Style file could not be resolved from the template reference.
    TemplateNotFound { expected: String, searched: PathBuf },
    /// Style named by the generated markup is absent from the staging directory.
    MissingClass(String),
    /// Generated markup carries no style directive.
    NoDocumentClass,
    Staging { path: PathBuf, source: io::Error },
    Typeset(TypesetError),
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(err) => write!(f, "{err}"),
            Self::Markup(err) => write!(f, "{err}"),
            Self::TemplateNotFound { expected, searched } => write!(
                f,
                "Template file '{expected}' not found in `{}`.",
                searched.display()
            ),
            Self::MissingClass(file) => {
                write!(f, "Required .cls file '{file}' is missing in build directory.")
            }
            Self::NoDocumentClass => write!(f, "generated markup has no \\documentclass directive"),
            Self::Staging { path, source } => {
                write!(f, "File copy failed for `{}`: {source}", path.display())
            }
            Self::Typeset(err) => write!(f, "LaTeX compilation failed: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(err) => Some(err),
            Self::Markup(err) => Some(err),
            Self::Staging { source, .. } => Some(source),
            Self::Typeset(err) => Some(err),
            Self::TemplateNotFound { .. } | Self::MissingClass(_) | Self::NoDocumentClass => None,
        }
    }
}

impl From<RepoError> for PipelineError {
    fn from(value: RepoError) -> Self {
        Self::Input(value)
    }
}

impl From<MarkupError> for PipelineError {
    fn from(value: MarkupError) -> Self {
        Self::Markup(value)
    }
}

impl From<TypesetError> for PipelineError {
    fn from(value: TypesetError) -> Self {
        Self::Typeset(value)
    }
}

/// Input for one compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub job_id: Uuid,
    /// Document source, by reference.
    pub document: PathBuf,
    /// Artifact file name, e.g. `resume.pdf`.
    pub output_name: String,
    /// Caller's template choice; the document's own template wins.
    pub template: Option<String>,
}

impl CompileRequest {
    pub fn new(document: impl Into<PathBuf>, output_name: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            document: document.into(),
            output_name: output_name.into(),
            template: None,
        }
    }

    pub fn with_template(mut self, template: Option<String>) -> Self {
        self.template = template.filter(|value| !value.trim().is_empty());
        self
    }

    /// Output base name used for the staged markup and the artifact.
    pub fn job_name(&self) -> String {
        Path::new(self.output_name.trim())
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or(DEFAULT_JOB_NAME)
            .to_string()
    }
}

/// Boundary result of one compile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileOutcome {
    pub job_id: Uuid,
    pub ok: bool,
    pub message: String,
    pub artifact: Option<PathBuf>,
}

impl CompileOutcome {
    pub fn success(job_id: Uuid, artifact: PathBuf) -> Self {
        Self {
            job_id,
            ok: true,
            message: SUCCESS_MESSAGE.to_string(),
            artifact: Some(artifact),
        }
    }

    pub fn failure(job_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            job_id,
            ok: false,
            message: message.into(),
            artifact: None,
        }
    }
}

/// Directories and defaults the pipeline works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Staging directory, cleared on every run.
    pub build_dir: PathBuf,
    /// Where bare template names are looked up.
    pub template_dir: PathBuf,
    pub default_template: String,
}

/// End-to-end compile orchestration.
pub struct CompilePipeline {
    settings: PipelineSettings,
    typesetter: Box<dyn Typesetter>,
}

impl CompilePipeline {
    pub fn new(settings: PipelineSettings, typesetter: Box<dyn Typesetter>) -> Self {
        Self {
            settings,
            typesetter,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Runs the pipeline and folds the result into an outcome.
    pub fn run(&self, request: &CompileRequest) -> CompileOutcome {
        let started_at = Instant::now();
        info!(
            "event=compile_run module=compiler status=start job_id={}",
            request.job_id
        );
        match self.build(request) {
            Ok(artifact) => {
                info!(
                    "event=compile_run module=compiler status=ok job_id={} duration_ms={}",
                    request.job_id,
                    started_at.elapsed().as_millis()
                );
                CompileOutcome::success(request.job_id, artifact)
            }
            Err(err) => {
                error!(
                    "event=compile_run module=compiler status=error job_id={} error_code={} duration_ms={}",
                    request.job_id,
                    err.code(),
                    started_at.elapsed().as_millis()
                );
                CompileOutcome::failure(request.job_id, err.to_string())
            }
        }
    }

    /// Runs every step and returns the artifact path.
    ///
    /// # Errors
    /// - `Input` when the document is missing or malformed.
    /// - `TemplateNotFound` / `MissingClass` before the typesetter is invoked.
    /// - `Typeset` with the tool's diagnostic when typesetting fails.
    pub fn build(&self, request: &CompileRequest) -> PipelineResult<PathBuf> {
        let document = FileDocumentRepository::new(&request.document).load()?;

        let reference = document
            .template()
            .map(str::to_string)
            .or_else(|| request.template.clone())
            .unwrap_or_else(|| self.settings.default_template.clone());
        let class_file = resolve_template(&self.settings.template_dir, &reference)?;

        let markup = MarkupGenerator::new(reference.as_str()).generate(&document)?;
        let tex = markup.to_latex();

        let staging = StagingArea::new(&self.settings.build_dir);
        staging.reset()?;
        staging.stage_copy(&class_file)?;
        let job_name = request.job_name();
        let source_file = format!("{job_name}.tex");
        staging.write(&source_file, &tex)?;
        staging.require_class(&tex)?;

        let artifact = self.typesetter.typeset(&TypesetJob {
            working_dir: staging.dir().to_path_buf(),
            source_file,
            job_name,
        })?;
        Ok(artifact)
    }
}

impl PipelineError {
    fn code(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Markup(_) => "markup",
            Self::TemplateNotFound { .. } => "template_not_found",
            Self::MissingClass(_) => "missing_class",
            Self::NoDocumentClass => "no_document_class",
            Self::Staging { .. } => "staging",
            Self::Typeset(_) => "typeset",
        }
    }
}
