//! Compile pipeline and external typesetter seam.
//!
//! # Responsibility
//! - Stage the template and generated markup into a clean build directory.
//! - Invoke the typesetter and report a `(success, message)` outcome.
//!
//! # Invariants
//! - Template resolution failures surface before the typesetter runs.
//! - Typesetter diagnostics are surfaced verbatim.

pub mod pipeline;
pub mod staging;
pub mod typesetter;

pub use pipeline::{
    CompileOutcome, CompilePipeline, CompileRequest, PipelineError, PipelineResult,
    PipelineSettings, SUCCESS_MESSAGE,
};
pub use staging::{document_class, resolve_template, StagingArea};
pub use typesetter::{LatexTypesetter, TypesetError, TypesetJob, Typesetter};
