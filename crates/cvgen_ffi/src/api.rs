//! FFI use-case API for UI-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to the UI via FRB.
//! - Hold the single open editor session for the process.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every failure is reported as `ok=false` plus a message.

use cvgen_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Column, Document, EditorSession, FileDocumentRepository, MarkupGenerator, SectionBody,
    SectionChange, SessionError, WorkspaceConfig,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

type Session = EditorSession<FileDocumentRepository>;

static SESSION: OnceLock<Mutex<Option<Session>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// One row of the section list the UI draws.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSummary {
    pub name: String,
    pub title: String,
    pub visible: bool,
    /// Effective column: `left|right`.
    pub column: String,
    /// Whether the column is set explicitly rather than inferred.
    pub column_pinned: bool,
}

/// Finished compile reported to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileStatus {
    pub job_id: String,
    pub ok: bool,
    /// Status, or the typesetter diagnostic verbatim on failure.
    pub message: String,
    pub artifact_path: Option<String>,
}

/// Generated markup preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewResponse {
    pub ok: bool,
    pub latex: String,
    pub message: String,
}

/// Opens the workspace and makes it the active session.
///
/// `document_path` overrides the configured document location when set.
///
/// # FFI contract
/// - Sync call; reads the document file once.
/// - Replaces any previously open session.
#[flutter_rust_bridge::frb(sync)]
pub fn workspace_open(document_path: Option<String>) -> ActionResponse {
    let mut config = match WorkspaceConfig::from_env() {
        Ok(config) => config,
        Err(err) => return ActionResponse::failure(format!("workspace_open failed: {err}")),
    };
    if let Some(path) = document_path
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
    {
        config.document_path = PathBuf::from(path);
    }

    let session = match EditorSession::open(&config) {
        Ok(session) => session,
        Err(err) => return ActionResponse::failure(format!("workspace_open failed: {err}")),
    };
    let count = session.orderer().len();
    match session_slot().lock() {
        Ok(mut slot) => {
            *slot = Some(session);
            ActionResponse::success(format!("Opened workspace with {count} section(s)."))
        }
        Err(_) => ActionResponse::failure("workspace_open failed: session lock poisoned"),
    }
}

/// Lists sections in current order, hidden ones included.
#[flutter_rust_bridge::frb(sync)]
pub fn workspace_sections() -> Vec<SectionSummary> {
    with_session(|session| {
        Ok(session
            .orderer()
            .sections()
            .iter()
            .map(|section| SectionSummary {
                name: section.name.clone(),
                title: section.title(),
                visible: section.visible,
                column: section.resolved_column().as_str().to_string(),
                column_pinned: section.column.is_some(),
            })
            .collect())
    })
    .unwrap_or_default()
}

/// Moves a section; indexes past the end move it last. Autosaves.
#[flutter_rust_bridge::frb(sync)]
pub fn section_reorder(name: String, new_index: u32) -> ActionResponse {
    mutate("section_reorder", |session| {
        session.reorder(name.trim(), new_index as usize)
    })
}

/// Removes a section and its data. Autosaves.
#[flutter_rust_bridge::frb(sync)]
pub fn section_remove(name: String) -> ActionResponse {
    mutate("section_remove", |session| session.remove(name.trim()))
}

/// Shows or hides a section. Hidden sections stay in the file as comments.
#[flutter_rust_bridge::frb(sync)]
pub fn section_set_visible(name: String, visible: bool) -> ActionResponse {
    mutate("section_set_visible", |session| {
        session.set_visible(name.trim(), visible)
    })
}

/// Pins a section to `left|right`, or returns it to inference with `None`.
#[flutter_rust_bridge::frb(sync)]
pub fn section_set_column(name: String, column: Option<String>) -> ActionResponse {
    let column = match column.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        None => None,
        Some(raw) => match Column::parse(raw) {
            Some(column) => Some(column),
            None => {
                return ActionResponse::failure(format!(
                    "section_set_column failed: unknown column `{raw}`; expected left|right"
                ))
            }
        },
    };
    mutate("section_set_column", |session| {
        session.set_column(name.trim(), column)
    })
}

/// Replaces a section body with parsed `yaml`. Saved on the next explicit save.
#[flutter_rust_bridge::frb(sync)]
pub fn section_update_yaml(name: String, yaml: String) -> ActionResponse {
    let value = match serde_yaml_value(&yaml) {
        Ok(value) => value,
        Err(err) => return ActionResponse::failure(format!("section_update_yaml failed: {err}")),
    };
    mutate("section_update_yaml", |session| {
        session.replace_body(name.trim(), SectionBody::from_value(value))
    })
}

/// Saves the full in-memory state.
#[flutter_rust_bridge::frb(sync)]
pub fn workspace_save() -> ActionResponse {
    match with_session(|session| session.save()) {
        Ok(()) => ActionResponse::success("Saved."),
        Err(err) => ActionResponse::failure(format!("workspace_save failed: {err}")),
    }
}

/// Saves and starts a background compile; poll with `compile_poll`.
///
/// # FFI contract
/// - Returns immediately; the typesetter runs on a worker thread.
/// - Rejected while a previous compile is still running.
#[flutter_rust_bridge::frb(sync)]
pub fn workspace_save_and_compile(template: Option<String>) -> ActionResponse {
    match with_session(|session| session.save_and_compile(template)) {
        Ok(job_id) => ActionResponse::success(format!("Compile started: {job_id}")),
        Err(err) => ActionResponse::failure(format!("workspace_save_and_compile failed: {err}")),
    }
}

/// Returns compiles that finished since the last poll.
#[flutter_rust_bridge::frb(sync)]
pub fn compile_poll() -> Vec<CompileStatus> {
    with_session(|session| {
        Ok(session
            .poll_compile()
            .into_iter()
            .map(|outcome| CompileStatus {
                job_id: outcome.job_id.to_string(),
                ok: outcome.ok,
                message: outcome.message,
                artifact_path: outcome
                    .artifact
                    .map(|path| path.to_string_lossy().into_owned()),
            })
            .collect())
    })
    .unwrap_or_default()
}

/// Renders `yaml` to LaTeX without touching disk.
///
/// `template` is used when the document names no template of its own.
#[flutter_rust_bridge::frb(sync)]
pub fn markup_preview(yaml: String, template: Option<String>) -> PreviewResponse {
    let template = template
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| WorkspaceConfig::default().default_template);
    let result = Document::parse(&yaml)
        .map_err(|err| err.to_string())
        .and_then(|document| {
            MarkupGenerator::new(template)
                .generate(&document)
                .map_err(|err| err.to_string())
        });
    match result {
        Ok(markup) => PreviewResponse {
            ok: true,
            latex: markup.to_latex(),
            message: format!("Rendered {} section(s).", markup.section_names().len()),
        },
        Err(message) => PreviewResponse {
            ok: false,
            latex: String::new(),
            message: format!("markup_preview failed: {message}"),
        },
    }
}

fn session_slot() -> &'static Mutex<Option<Session>> {
    SESSION.get_or_init(|| Mutex::new(None))
}

fn with_session<T>(
    f: impl FnOnce(&mut Session) -> Result<T, SessionError>,
) -> Result<T, String> {
    let mut slot = session_slot()
        .lock()
        .map_err(|_| "session lock poisoned".to_string())?;
    let session = slot
        .as_mut()
        .ok_or_else(|| "no workspace is open; call workspace_open first".to_string())?;
    f(session).map_err(|err| err.to_string())
}

fn mutate(
    operation: &str,
    f: impl FnOnce(&mut Session) -> Result<SectionChange, SessionError>,
) -> ActionResponse {
    match with_session(f) {
        Ok(SectionChange::Unchanged) => ActionResponse::success("No change."),
        Ok(SectionChange::BodyEdited { .. }) => ActionResponse::success("Updated; unsaved."),
        Ok(_) => ActionResponse::success("Updated and saved."),
        Err(err) => {
            warn!(
                "event=ffi_call module=ffi status=error operation={}",
                operation
            );
            ActionResponse::failure(format!("{operation} failed: {err}"))
        }
    }
}

fn serde_yaml_value(yaml: &str) -> Result<serde_yaml::Value, String> {
    if yaml.trim().is_empty() {
        return Ok(serde_yaml::Value::Null);
    }
    serde_yaml::from_str(yaml).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        compile_poll, core_version, init_logging, markup_preview, ping, section_remove,
        section_reorder, section_set_column, section_set_visible, section_update_yaml,
        workspace_open, workspace_sections,
    };

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn markup_preview_renders_without_disk() {
        let response = markup_preview(
            "cls: modern\nskills: [rust, go]\n".to_string(),
            Some("deedy".to_string()),
        );
        assert!(response.ok, "{}", response.message);
        assert!(response.latex.starts_with("\\documentclass{modern}"));
        assert!(response.latex.contains("rust go"));

        let failed = markup_preview("skills: [a\n".to_string(), None);
        assert!(!failed.ok);
        assert!(failed.latex.is_empty());
    }

    #[test]
    fn session_flow_reports_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.yaml");
        std::fs::write(&path, "skills: [rust]\nawards: [Prize]\n").unwrap();

        let opened = workspace_open(Some(path.to_string_lossy().into_owned()));
        assert!(opened.ok, "{}", opened.message);

        assert!(section_reorder("awards".to_string(), 0).ok);
        assert!(section_set_visible("skills".to_string(), false).ok);
        assert!(section_set_column("awards".to_string(), Some("left".to_string())).ok);
        assert!(!section_set_column("awards".to_string(), Some("middle".to_string())).ok);

        let sections = workspace_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "awards");
        assert_eq!(sections[0].column, "left");
        assert!(sections[0].column_pinned);
        assert!(!sections[1].visible);

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("# skills:"));

        let edited = section_update_yaml("awards".to_string(), "[Medal]".to_string());
        assert!(edited.ok, "{}", edited.message);
        assert!(!section_remove("ghost".to_string()).ok);
        assert!(compile_poll().is_empty());
    }
}
