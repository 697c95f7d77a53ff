//! Build directory staging and template resolution.
//!
//! # Invariants
//! - `reset` leaves an empty directory; nothing from a prior run survives.
//! - Staged files are written write-new-then-replace.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};

use super::pipeline::PipelineError;
use crate::repo::write_atomic;

const CLASS_EXTENSION: &str = "cls";

static DOCUMENT_CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\documentclass(?:\[[^\]]*\])?\{([^}]*)\}").expect("valid documentclass regex")
});

/// Scratch directory the typesetter runs in.
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Clears and recreates the directory.
    pub fn reset(&self) -> Result<(), PipelineError> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(self.staging_error(&self.dir, source)),
        }
        std::fs::create_dir_all(&self.dir).map_err(|source| self.staging_error(&self.dir, source))
    }

    /// Copies `source` into the directory under its own file name.
    pub fn stage_copy(&self, source: &Path) -> Result<PathBuf, PipelineError> {
        let file_name = source.file_name().ok_or_else(|| {
            self.staging_error(
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })?;
        let bytes = std::fs::read(source).map_err(|err| self.staging_error(source, err))?;
        let target = self.dir.join(file_name);
        write_atomic(&target, &bytes).map_err(|err| self.staging_error(&target, err))?;
        Ok(target)
    }

    /// Writes `contents` to `file_name` inside the directory.
    pub fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf, PipelineError> {
        let target = self.dir.join(file_name);
        write_atomic(&target, contents.as_bytes())
            .map_err(|err| self.staging_error(&target, err))?;
        Ok(target)
    }

    /// Checks that the class named by `tex`'s `\documentclass` is staged.
    pub fn require_class(&self, tex: &str) -> Result<PathBuf, PipelineError> {
        let name = document_class(tex).ok_or(PipelineError::NoDocumentClass)?;
        let expected = self.dir.join(format!("{name}.{CLASS_EXTENSION}"));
        if expected.is_file() {
            Ok(expected)
        } else {
            Err(PipelineError::MissingClass(format!("{name}.{CLASS_EXTENSION}")))
        }
    }

    fn staging_error(&self, path: &Path, source: io::Error) -> PipelineError {
        PipelineError::Staging {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Class name from the first `\documentclass[...]{name}` directive.
pub fn document_class(tex: &str) -> Option<&str> {
    DOCUMENT_CLASS_RE
        .captures(tex)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().trim())
        .filter(|name| !name.is_empty())
}

/// Resolves a template reference to a `.cls` file.
///
/// An existing path ending in `.cls` is used as given; otherwise the base
/// name is looked up as `<template_dir>/<name>.cls`.
pub fn resolve_template(template_dir: &Path, reference: &str) -> Result<PathBuf, PipelineError> {
    let reference = reference.trim();
    let direct = Path::new(reference);
    let is_class_path = direct
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CLASS_EXTENSION));
    if is_class_path && direct.is_file() {
        return Ok(direct.to_path_buf());
    }

    let stem = direct
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(reference);
    let candidate = template_dir.join(format!("{stem}.{CLASS_EXTENSION}"));
    if candidate.is_file() {
        return Ok(candidate);
    }
    Err(PipelineError::TemplateNotFound {
        expected: format!("{stem}.{CLASS_EXTENSION}"),
        searched: template_dir.to_path_buf(),
    })
}
