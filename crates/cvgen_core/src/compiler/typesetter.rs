//! External typesetting tool seam.
//!
//! # Responsibility
//! - Define the `Typesetter` contract the pipeline calls.
//! - Provide the process-backed LaTeX implementation.
//!
//! # Invariants
//! - Tool diagnostics are returned verbatim, never summarized.

use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::time::Instant;

/// One typesetting invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypesetJob {
    /// Staging directory; the tool runs here.
    pub working_dir: PathBuf,
    /// Markup file name relative to `working_dir`.
    pub source_file: String,
    /// Output base name; the artifact is `<job_name>.pdf`.
    pub job_name: String,
}

impl TypesetJob {
    pub fn artifact_path(&self) -> PathBuf {
        self.working_dir.join(format!("{}.pdf", self.job_name))
    }
}

#[derive(Debug)]
pub enum TypesetError {
    /// Tool could not be started.
    Spawn { program: String, source: io::Error },
    /// Tool ran and reported failure.
    Failed {
        status: Option<i32>,
        /// Tool stdout followed by stderr, verbatim.
        diagnostic: String,
    },
    /// Tool reported success but produced no artifact.
    MissingArtifact(PathBuf),
}

impl Display for TypesetError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn { program, source } => {
                write!(f, "failed to start typesetter `{program}`: {source}")
            }
            Self::Failed { status, diagnostic } => {
                match status {
                    Some(code) => writeln!(f, "typesetter exited with status {code}")?,
                    None => writeln!(f, "typesetter terminated by signal")?,
                }
                write!(f, "{diagnostic}")
            }
            Self::MissingArtifact(path) => {
                write!(f, "typesetter produced no output at `{}`", path.display())
            }
        }
    }
}

impl Error for TypesetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Failed { .. } | Self::MissingArtifact(_) => None,
        }
    }
}

/// Turns staged markup into a binary artifact.
pub trait Typesetter: Send + Sync {
    /// Runs the tool and returns the artifact path.
    fn typeset(&self, job: &TypesetJob) -> Result<PathBuf, TypesetError>;
}

/// Runs a LaTeX engine (`pdflatex`, `xelatex`, ...) as a child process.
#[derive(Debug, Clone)]
pub struct LatexTypesetter {
    program: String,
}

impl LatexTypesetter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Typesetter for LatexTypesetter {
    fn typeset(&self, job: &TypesetJob) -> Result<PathBuf, TypesetError> {
        let started_at = Instant::now();
        info!(
            "event=typeset_invoke module=compiler status=start program={} job={}",
            self.program, job.job_name
        );
        let output = Command::new(&self.program)
            .arg("-interaction=nonstopmode")
            .arg("-halt-on-error")
            .arg(format!("-jobname={}", job.job_name))
            .arg(&job.source_file)
            .current_dir(&job.working_dir)
            .output()
            .map_err(|source| {
                error!(
                    "event=typeset_invoke module=compiler status=error error_code=spawn_failed program={}",
                    self.program
                );
                TypesetError::Spawn {
                    program: self.program.clone(),
                    source,
                }
            })?;

        if !output.status.success() {
            error!(
                "event=typeset_invoke module=compiler status=error error_code=tool_failed exit_code={} duration_ms={}",
                output.status.code().unwrap_or(-1),
                started_at.elapsed().as_millis()
            );
            let mut diagnostic = String::from_utf8_lossy(&output.stdout).into_owned();
            diagnostic.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(TypesetError::Failed {
                status: output.status.code(),
                diagnostic,
            });
        }

        let artifact = job.artifact_path();
        if !artifact.is_file() {
            return Err(TypesetError::MissingArtifact(artifact));
        }
        info!(
            "event=typeset_invoke module=compiler status=ok job={} duration_ms={}",
            job.job_name,
            started_at.elapsed().as_millis()
        );
        Ok(artifact)
    }
}
