//! Persistence listener for orderer change events.
//!
//! # Responsibility
//! - Decide per `SectionChange` whether to persist now, defer, or skip.
//! - Report persistence failures without touching in-memory state.
//!
//! # Invariants
//! - A failed persist leaves the listener dirty until the next success.
//! - The previously saved file survives a failed persist unchanged.

use log::{error, info};

use super::section_service::{SectionChange, SectionOrderer};
use crate::repo::{DocumentRepository, RepoError, RepoResult};

/// What the listener did with one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistDecision {
    Persisted,
    /// Recorded as unsaved; written on the next explicit save.
    Deferred,
    /// Nothing to persist.
    Skipped,
}

/// Writes the persisted form when structural changes happen.
pub struct AutosaveListener<R: DocumentRepository> {
    repo: R,
    dirty: bool,
    last_error: Option<String>,
}

impl<R: DocumentRepository> AutosaveListener<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            dirty: false,
            last_error: None,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Whether in-memory state differs from what was last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Message of the most recent failed persist, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Handles one change event from `orderer`.
    ///
    /// # Errors
    /// - Returns the repository error when an immediate persist fails.
    pub fn on_change(
        &mut self,
        orderer: &SectionOrderer,
        change: &SectionChange,
    ) -> RepoResult<PersistDecision> {
        if change.requires_autosave() {
            self.autosave_persist(orderer)?;
            return Ok(PersistDecision::Persisted);
        }
        match change {
            SectionChange::Unchanged => Ok(PersistDecision::Skipped),
            _ => {
                self.dirty = true;
                Ok(PersistDecision::Deferred)
            }
        }
    }

    /// Regenerates the persisted form from scratch and saves it.
    pub fn autosave_persist(&mut self, orderer: &SectionOrderer) -> RepoResult<()> {
        let result = orderer
            .render_persisted()
            .map_err(RepoError::Encode)
            .and_then(|text| self.repo.save_raw(&text));
        match result {
            Ok(()) => {
                self.dirty = false;
                self.last_error = None;
                info!(
                    "event=autosave_persist module=service status=ok sections={}",
                    orderer.len()
                );
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                self.last_error = Some(err.to_string());
                error!(
                    "event=autosave_persist module=service status=error error_code=persist_failed error={}",
                    err
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AutosaveListener, PersistDecision};
    use crate::model::document::Document;
    use crate::repo::{DocumentRepository, FileDocumentRepository, LoadedDocument, RepoResult};
    use crate::service::section_service::{SectionChange, SectionOrderer};
    use std::cell::RefCell;

    /// Repository that fails every write.
    struct ReadOnlyRepo {
        writes: RefCell<usize>,
    }

    impl DocumentRepository for ReadOnlyRepo {
        fn load(&self) -> RepoResult<Document> {
            Ok(Document::new())
        }

        fn load_workspace(&self) -> RepoResult<LoadedDocument> {
            Ok(LoadedDocument::default())
        }

        fn save(&self, _document: &Document) -> RepoResult<()> {
            self.save_raw("")
        }

        fn save_raw(&self, _content: &str) -> RepoResult<()> {
            *self.writes.borrow_mut() += 1;
            Err(crate::repo::RepoError::Io {
                path: "read-only.yaml".into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    fn orderer() -> SectionOrderer {
        SectionOrderer::from_document(Document::parse("a: [1]\nb: [2]\n").unwrap())
    }

    #[test]
    fn structural_changes_persist_and_body_edits_defer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.yaml");
        let mut listener = AutosaveListener::new(FileDocumentRepository::new(&path));
        let mut orderer = orderer();

        let change = orderer.reorder("b", 0).unwrap();
        assert_eq!(
            listener.on_change(&orderer, &change).unwrap(),
            PersistDecision::Persisted
        );
        assert!(std::fs::read_to_string(&path)
            .unwrap()
            .starts_with("_order:\n- b\n- a\n"));

        let edit = SectionChange::BodyEdited {
            name: "a".to_string(),
        };
        assert_eq!(
            listener.on_change(&orderer, &edit).unwrap(),
            PersistDecision::Deferred
        );
        assert!(listener.is_dirty());
        assert_eq!(
            listener
                .on_change(&orderer, &SectionChange::Unchanged)
                .unwrap(),
            PersistDecision::Skipped
        );

        listener.autosave_persist(&orderer).unwrap();
        assert!(!listener.is_dirty());
    }

    #[test]
    fn failed_persist_is_reported_and_state_kept() {
        let mut listener = AutosaveListener::new(ReadOnlyRepo {
            writes: RefCell::new(0),
        });
        let mut orderer = orderer();
        let change = orderer.remove("a").unwrap();

        let error = listener
            .on_change(&orderer, &change)
            .expect_err("read-only repo must fail");
        assert!(error.to_string().contains("read-only"));
        assert!(listener.is_dirty());
        assert!(listener.last_error().is_some());
        assert_eq!(*listener.repository().writes.borrow(), 1);
        assert_eq!(orderer.order(), vec!["b"]);
    }
}
