//! Document repository contract and file implementation.
//!
//! # Responsibility
//! - Load the persisted document (strictly, or as empty when absent).
//! - Save either a whole document or pre-rendered text (autosave output).
//! - Recover hidden sections that were persisted as commented-out blocks.
//!
//! # Invariants
//! - `save_raw` validates text before replacing the previous file.
//! - A failed save leaves the previously saved file untouched.
//! - Recovered hidden sections never shadow a visible section.

use crate::model::document::{is_meta_key, Document, DocumentError};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::atomic::write_atomic;

/// Prefix written in front of every line of a hidden section block.
pub const COMMENT_MARKER: &str = "# ";

pub type RepoResult<T> = Result<T, RepoError>;

static SECTION_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][^:#\s]*\s*:(?:\s|$)").expect("valid section key regex")
});

/// Document store error.
#[derive(Debug)]
pub enum RepoError {
    /// Strict load of a file that does not exist.
    NotFound(PathBuf),
    Io { path: PathBuf, source: io::Error },
    /// Stored or submitted text is not a valid document.
    Document { path: PathBuf, source: DocumentError },
    /// In-memory state could not be encoded for saving.
    Encode(DocumentError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "{} not found. Please provide a data file.", path.display()),
            Self::Io { path, source } => write!(f, "document I/O failed for `{}`: {source}", path.display()),
            Self::Document { path, source } => write!(f, "invalid document `{}`: {source}", path.display()),
            Self::Encode(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Document { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}

/// A section recovered from a commented-out block.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenSection {
    pub name: String,
    pub value: Value,
}

/// Parsed document plus the hidden sections found alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedDocument {
    pub document: Document,
    /// In file order.
    pub hidden: Vec<HiddenSection>,
}

/// Repository interface for the persisted résumé document.
pub trait DocumentRepository {
    /// Loads the document; missing storage is `RepoError::NotFound`.
    fn load(&self) -> RepoResult<Document>;

    /// Loads the document and recovers hidden sections; missing storage is empty.
    fn load_workspace(&self) -> RepoResult<LoadedDocument>;

    /// Replaces stored content with `document`.
    fn save(&self, document: &Document) -> RepoResult<()>;

    /// Replaces stored content with pre-rendered `content` after validating it.
    fn save_raw(&self, content: &str) -> RepoResult<()>;

    /// Loads the document, treating missing storage as an empty document.
    fn load_or_default(&self) -> RepoResult<Document> {
        match self.load() {
            Ok(document) => Ok(document),
            Err(RepoError::NotFound(_)) => Ok(Document::new()),
            Err(err) => Err(err),
        }
    }
}

/// File-backed document repository.
#[derive(Debug, Clone)]
pub struct FileDocumentRepository {
    path: PathBuf,
}

impl FileDocumentRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_text(&self) -> RepoResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(RepoError::Io {
                path: self.path.clone(),
                source: err,
            }),
        }
    }

    fn parse(&self, text: &str) -> RepoResult<Document> {
        Document::parse(text).map_err(|source| RepoError::Document {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, content: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        match write_atomic(&self.path, content.as_bytes()) {
            Ok(()) => {
                info!(
                    "event=document_save module=repo status=ok bytes={} duration_ms={}",
                    content.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=document_save module=repo status=error duration_ms={} error_code=write_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(RepoError::Io {
                    path: self.path.clone(),
                    source: err,
                })
            }
        }
    }
}

impl DocumentRepository for FileDocumentRepository {
    fn load(&self) -> RepoResult<Document> {
        let text = self
            .read_text()?
            .ok_or_else(|| RepoError::NotFound(self.path.clone()))?;
        let document = self.parse(&text)?;
        info!(
            "event=document_load module=repo status=ok sections={}",
            document.as_mapping().len()
        );
        Ok(document)
    }

    fn load_workspace(&self) -> RepoResult<LoadedDocument> {
        let Some(text) = self.read_text()? else {
            info!("event=document_load module=repo status=ok mode=workspace sections=0 missing=true");
            return Ok(LoadedDocument::default());
        };
        let document = self.parse(&text)?;
        let known = document.order().unwrap_or_default();
        let hidden = recover_hidden_sections(&text)
            .into_iter()
            .filter(|section| known.contains(&section.name) && !document.contains(&section.name))
            .collect::<Vec<_>>();
        info!(
            "event=document_load module=repo status=ok mode=workspace sections={} hidden={}",
            document.as_mapping().len(),
            hidden.len()
        );
        Ok(LoadedDocument { document, hidden })
    }

    fn save(&self, document: &Document) -> RepoResult<()> {
        let content = document.to_yaml().map_err(RepoError::Encode)?;
        self.write(&content)
    }

    fn save_raw(&self, content: &str) -> RepoResult<()> {
        self.parse(content)?;
        self.write(content)
    }
}

/// Recovers sections persisted as commented-out blocks.
///
/// Every maximal run of lines starting with `COMMENT_MARKER` (or a bare `#`)
/// is un-commented and parsed as a mapping. A run that does not parse is
/// split at unindented `key:` lines and each block is parsed on its own, so
/// prose next to a hidden block does not hide it. Document-level keys are
/// never returned.
pub fn recover_hidden_sections(raw: &str) -> Vec<HiddenSection> {
    let mut recovered = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    for line in raw.lines() {
        match strip_comment_marker(line) {
            Some(stripped) => run.push(stripped),
            None => flush_comment_run(&mut run, &mut recovered),
        }
    }
    flush_comment_run(&mut run, &mut recovered);
    recovered
}

fn strip_comment_marker(line: &str) -> Option<&str> {
    if let Some(rest) = line.strip_prefix(COMMENT_MARKER) {
        return Some(rest);
    }
    if line.trim_end() == "#" {
        return Some("");
    }
    None
}

fn flush_comment_run(run: &mut Vec<&str>, recovered: &mut Vec<HiddenSection>) {
    if run.is_empty() {
        return;
    }
    let text = run.join("\n");
    let chunks = match serde_yaml::from_str::<Value>(&text) {
        Ok(Value::Mapping(entries)) => vec![entries],
        _ => split_section_blocks(run)
            .iter()
            .filter_map(|block| match serde_yaml::from_str::<Value>(block) {
                Ok(Value::Mapping(entries)) => Some(entries),
                _ => None,
            })
            .collect(),
    };
    run.clear();

    for entries in chunks {
        push_sections(entries, recovered);
    }
}

/// Splits a comment run into candidate `key:` blocks, dropping prose lines.
///
/// A block starts at an unindented `key:` line and continues through
/// indented, `-` sequence and empty lines.
fn split_section_blocks(lines: &[&str]) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<Vec<&str>> = None;
    for &line in lines {
        if SECTION_KEY_RE.is_match(line) {
            if let Some(block) = current.take() {
                blocks.push(block.join("\n"));
            }
            current = Some(vec![line]);
            continue;
        }
        let continues = line.trim().is_empty()
            || line.starts_with(char::is_whitespace)
            || line.starts_with('-');
        match current.as_mut() {
            Some(block) if continues => block.push(line),
            Some(_) => {
                if let Some(block) = current.take() {
                    blocks.push(block.join("\n"));
                }
            }
            None => {}
        }
    }
    if let Some(block) = current {
        blocks.push(block.join("\n"));
    }
    blocks
}

fn push_sections(entries: Mapping, recovered: &mut Vec<HiddenSection>) {
    for (key, value) in entries {
        let Some(name) = key.as_str() else {
            continue;
        };
        if is_meta_key(name) {
            continue;
        }
        recovered.push(HiddenSection {
            name: name.to_string(),
            value,
        });
    }
}
