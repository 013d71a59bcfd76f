//! Edit session: one macro, one pass through the external editor.
//!
//! ```text
//! Start -> Loaded -> Rendered -> AwaitingExternalEdit -> Parsed -> Decided
//!       -> Persisted | Skipped | Aborted
//! ```
//!
//! Any failure aborts the remaining stages. Nothing is written to the store
//! before the edited document has been fully validated, and the document is
//! left on disk so the operator can fix it and try again. The store is
//! closed on every exit path; an uncommitted write is rolled back.

use crate::diff::MacroDiff;
use crate::editor::{Editor, EditorError};
use crate::store::{MacroStore, StoreError};
use obinskit_macro::{
    decode_flat, encode_flat, format_raw_value, parse_document, parse_raw_value, render_document,
    CodecError, FlatValue, KeycodeIndex, MacroSequence,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort an edit session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the macro store failed (includes a missing or
    /// ambiguous macro name)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored macro_value cannot be decoded or rendered
    #[error("Stored macro_value of \"{name}\" is invalid: {source}")]
    InvalidStoredMacro {
        name: String,
        #[source]
        source: CodecError,
    },

    /// The editor could not be launched
    #[error(transparent)]
    Editor(#[from] EditorError),

    /// The editor exited with a non-zero status; the store was not touched
    #[error("Editor exited with status {status}; nothing was written (document kept at {})", .path.display())]
    EditorFailed { status: i32, path: PathBuf },

    /// The edited document does not parse; fix it and run the session again
    #[error("Edited macro in {} is invalid: {source}", .path.display())]
    MalformedEdit {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// Creating, writing or reading back the editable document failed
    #[error("Document I/O error on {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Session state machine stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Loaded,
    Rendered,
    AwaitingExternalEdit,
    Parsed,
    Decided,
    Persisted,
    Skipped,
    Aborted,
}

/// How a session that did not fail ended
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// Edited macro encodes to the original value; nothing written
    Unchanged,
    /// New value written and committed
    Persisted { diff: MacroDiff, raw: String },
    /// New value computed but not written
    DryRun { diff: MacroDiff, raw: String },
}

impl SessionOutcome {
    pub fn diff(&self) -> Option<&MacroDiff> {
        match self {
            SessionOutcome::Unchanged => None,
            SessionOutcome::Persisted { diff, .. } | SessionOutcome::DryRun { diff, .. } => {
                Some(diff)
            }
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Compute and report everything, but do not write
    pub dry_run: bool,
    /// Directory for the editable document (system temp dir if unset)
    pub document_dir: Option<PathBuf>,
}

/// One edit of one macro
#[derive(Debug)]
pub struct EditSession {
    macro_name: String,
    options: SessionOptions,
    stage: Stage,
    original_flat: FlatValue,
    edited_flat: Option<FlatValue>,
    changed: bool,
    document: Option<PathBuf>,
}

impl EditSession {
    pub fn new(macro_name: impl Into<String>, options: SessionOptions) -> Self {
        Self {
            macro_name: macro_name.into(),
            options,
            stage: Stage::Start,
            original_flat: Vec::new(),
            edited_flat: None,
            changed: false,
            document: None,
        }
    }

    pub fn macro_name(&self) -> &str {
        &self.macro_name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn original_flat(&self) -> &[u32] {
        &self.original_flat
    }

    pub fn edited_flat(&self) -> Option<&[u32]> {
        self.edited_flat.as_deref()
    }

    pub fn changed(&self) -> bool {
        self.changed
    }

    /// Path of the editable document, once rendered
    pub fn document_path(&self) -> Option<&Path> {
        self.document.as_deref()
    }

    /// Run every stage, then close the store whatever the result.
    pub fn run(
        &mut self,
        store: &mut dyn MacroStore,
        editor: &dyn Editor,
        index: &KeycodeIndex,
    ) -> Result<SessionOutcome, SessionError> {
        let result = self.run_stages(store, editor, index);
        if result.is_err() {
            self.stage = Stage::Aborted;
            if let Some(path) = &self.document {
                info!("Editable document kept at {}", path.display());
            }
        }

        let closed = store.close();
        match (result, closed) {
            (Ok(outcome), Ok(())) => Ok(outcome),
            (Ok(_), Err(e)) => {
                self.stage = Stage::Aborted;
                Err(e.into())
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("Failed to close store after error: {close_err}");
                Err(e)
            }
        }
    }

    fn run_stages(
        &mut self,
        store: &mut dyn MacroStore,
        editor: &dyn Editor,
        index: &KeycodeIndex,
    ) -> Result<SessionOutcome, SessionError> {
        let original = self.load(store)?;
        let path = self.render(&original, index)?;
        self.await_edit(editor, &path)?;
        let edited = self.parse(&path, index)?;

        let Some(diff) = self.decide(&edited) else {
            info!("macro_value of \"{}\" not changed, nothing to update", self.macro_name);
            self.stage = Stage::Skipped;
            return Ok(SessionOutcome::Unchanged);
        };
        info!(
            "Unified diff between old and new macro_value:\n{}",
            diff.unified()
        );

        let raw = format_raw_value(self.edited_flat.as_deref().unwrap_or_default());
        if self.options.dry_run {
            info!("Dry run: would set macro_value of \"{}\" to {raw}", self.macro_name);
            return Ok(SessionOutcome::DryRun { diff, raw });
        }

        store.write_macro(&self.macro_name, &raw)?;
        store.commit()?;
        self.stage = Stage::Persisted;
        info!("Set macro_value of \"{}\" to {raw}", self.macro_name);
        Ok(SessionOutcome::Persisted { diff, raw })
    }

    /// Start -> Loaded: fetch and decode the stored value
    fn load(&mut self, store: &mut dyn MacroStore) -> Result<MacroSequence, SessionError> {
        let raw = store.read_macro(&self.macro_name)?;
        let invalid = |source| SessionError::InvalidStoredMacro {
            name: self.macro_name.clone(),
            source,
        };

        self.original_flat = parse_raw_value(&raw).map_err(invalid)?;
        let seq = decode_flat(&self.original_flat).map_err(invalid)?;
        debug!(
            "Loaded \"{}\": {} values, {} events",
            self.macro_name,
            self.original_flat.len(),
            seq.len()
        );
        self.stage = Stage::Loaded;
        Ok(seq)
    }

    /// Loaded -> Rendered: write the editable document to a kept temp file
    fn render(&mut self, seq: &MacroSequence, index: &KeycodeIndex) -> Result<PathBuf, SessionError> {
        let doc = render_document(seq, index).map_err(|source| SessionError::InvalidStoredMacro {
            name: self.macro_name.clone(),
            source,
        })?;
        for (i, event) in seq.iter().enumerate() {
            debug!("{i:3}: {}", event.describe(index));
        }

        let dir = self
            .options
            .document_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let (mut file, path) = tempfile::Builder::new()
            .prefix("obinskit-macro-")
            .suffix(".txt")
            .tempfile_in(&dir)
            .map_err(|source| SessionError::Document {
                path: dir.clone(),
                source,
            })?
            .keep()
            .map_err(|e| SessionError::Document {
                path: e.file.path().to_path_buf(),
                source: e.error,
            })?;
        // Record the path first so it is reported even if the write fails
        self.document = Some(path.clone());
        file.write_all(doc.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| SessionError::Document {
                path: path.clone(),
                source,
            })?;

        debug!("Wrote editable document to {}", path.display());
        self.stage = Stage::Rendered;
        Ok(path)
    }

    /// Rendered -> AwaitingExternalEdit: block until the editor exits
    fn await_edit(&mut self, editor: &dyn Editor, path: &Path) -> Result<(), SessionError> {
        self.stage = Stage::AwaitingExternalEdit;
        let status = editor.run(path)?;
        if status != 0 {
            return Err(SessionError::EditorFailed {
                status,
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    /// AwaitingExternalEdit -> Parsed: read back and validate the document
    fn parse(&mut self, path: &Path, index: &KeycodeIndex) -> Result<MacroSequence, SessionError> {
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::Document {
            path: path.to_path_buf(),
            source,
        })?;
        let seq = parse_document(&text, index).map_err(|source| SessionError::MalformedEdit {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Parsed {} events from edited document", seq.len());
        self.stage = Stage::Parsed;
        Ok(seq)
    }

    /// Parsed -> Decided: re-encode and compare. Returns the diff if changed.
    fn decide(&mut self, edited: &MacroSequence) -> Option<MacroDiff> {
        let flat = encode_flat(edited);
        debug!("old macro_value: {}", format_raw_value(&self.original_flat));
        debug!("new macro_value: {}", format_raw_value(&flat));

        self.changed = flat != self.original_flat;
        let diff = self
            .changed
            .then(|| MacroDiff::between(&self.original_flat, &flat));
        self.edited_flat = Some(flat);
        self.stage = Stage::Decided;
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obinskit_macro::keycode_index;
    use std::cell::RefCell;

    /// In-memory store that records every call
    #[derive(Default)]
    struct MemoryStore {
        rows: Vec<(String, String)>,
        pending: Option<(String, String)>,
        calls: Vec<&'static str>,
    }

    impl MemoryStore {
        fn with(name: &str, raw: &str) -> Self {
            Self {
                rows: vec![(name.to_string(), raw.to_string())],
                ..Self::default()
            }
        }
    }

    impl MacroStore for MemoryStore {
        fn read_macro(&mut self, name: &str) -> Result<String, StoreError> {
            self.calls.push("read");
            let matches: Vec<&(String, String)> =
                self.rows.iter().filter(|(n, _)| n == name).collect();
            match matches.as_slice() {
                [] => Err(StoreError::MacroNotFound {
                    name: name.to_string(),
                    known: self.rows.iter().map(|(n, _)| n.clone()).collect(),
                }),
                [(_, raw)] => Ok(raw.clone()),
                more => Err(StoreError::AmbiguousMacroName {
                    name: name.to_string(),
                    rows: more.len(),
                }),
            }
        }

        fn write_macro(&mut self, name: &str, raw: &str) -> Result<(), StoreError> {
            self.calls.push("write");
            self.pending = Some((name.to_string(), raw.to_string()));
            Ok(())
        }

        fn commit(&mut self) -> Result<(), StoreError> {
            self.calls.push("commit");
            if let Some((name, raw)) = self.pending.take() {
                for row in self.rows.iter_mut().filter(|(n, _)| *n == name) {
                    row.1 = raw.clone();
                }
            }
            Ok(())
        }

        fn close(&mut self) -> Result<(), StoreError> {
            self.calls.push("close");
            self.pending = None;
            Ok(())
        }
    }

    /// Editor that applies a text transformation and exits with `status`
    struct ScriptedEditor<F: Fn(&str) -> String> {
        edit: F,
        status: i32,
        seen: RefCell<Option<String>>,
    }

    impl<F: Fn(&str) -> String> ScriptedEditor<F> {
        fn new(edit: F) -> Self {
            Self {
                edit,
                status: 0,
                seen: RefCell::new(None),
            }
        }
    }

    impl<F: Fn(&str) -> String> Editor for ScriptedEditor<F> {
        fn run(&self, path: &Path) -> Result<i32, EditorError> {
            let text = std::fs::read_to_string(path).unwrap();
            std::fs::write(path, (self.edit)(&text)).unwrap();
            *self.seen.borrow_mut() = Some(text);
            Ok(self.status)
        }
    }

    fn options(dir: &tempfile::TempDir, dry_run: bool) -> SessionOptions {
        SessionOptions {
            dry_run,
            document_dir: Some(dir.path().to_path_buf()),
        }
    }

    const PRESS_J: &str = "[2,13,0,3,10,0,1,13,0]";

    #[test]
    fn unchanged_edit_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", PRESS_J);
        let editor = ScriptedEditor::new(str::to_string);
        let mut session = EditSession::new("m", options(&dir, false));

        let outcome = session.run(&mut store, &editor, keycode_index()).unwrap();
        assert!(matches!(outcome, SessionOutcome::Unchanged));
        assert_eq!(session.stage(), Stage::Skipped);
        assert!(!session.changed());
        assert_eq!(session.edited_flat(), Some(session.original_flat()));
        assert_eq!(store.calls, ["read", "close"]);

        let seen = editor.seen.borrow().clone().unwrap();
        assert!(seen.ends_with("KEY_DOWN J\nWAIT     10\nKEY_UP   J\n"));
    }

    #[test]
    fn changed_wait_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", PRESS_J);
        let editor = ScriptedEditor::new(|t: &str| t.replace("WAIT     10\n", "WAIT 500\n"));
        let mut session = EditSession::new("m", options(&dir, false));

        let outcome = session.run(&mut store, &editor, keycode_index()).unwrap();
        let SessionOutcome::Persisted { diff, raw } = outcome else {
            panic!("expected Persisted, got {outcome:?}");
        };
        assert_eq!(raw, "[2,13,0,3,244,1,1,13,0]");
        assert_eq!(diff.changes().len(), 2);
        assert_eq!(diff.changes()[0].line, "(3, 10, 0)");
        assert_eq!(diff.changes()[1].line, "(3, 244, 1)");
        assert_eq!(session.stage(), Stage::Persisted);
        assert!(session.changed());
        assert_eq!(store.calls, ["read", "write", "commit", "close"]);
        assert_eq!(store.rows[0].1, "[2,13,0,3,244,1,1,13,0]");
    }

    #[test]
    fn dry_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", PRESS_J);
        let editor = ScriptedEditor::new(|t: &str| t.replace("WAIT     10\n", "WAIT 500\n"));
        let mut session = EditSession::new("m", options(&dir, true));

        let outcome = session.run(&mut store, &editor, keycode_index()).unwrap();
        assert!(matches!(&outcome, SessionOutcome::DryRun { raw, .. } if raw == "[2,13,0,3,244,1,1,13,0]"));
        assert!(outcome.diff().is_some());
        assert_eq!(store.calls, ["read", "close"]);
        assert_eq!(store.rows[0].1, PRESS_J);
    }

    #[test]
    fn editor_failure_aborts_and_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", PRESS_J);
        let mut editor = ScriptedEditor::new(|_: &str| String::from("garbage"));
        editor.status = 2;
        let mut session = EditSession::new("m", options(&dir, false));

        let err = session.run(&mut store, &editor, keycode_index()).unwrap_err();
        assert!(matches!(err, SessionError::EditorFailed { status: 2, .. }));
        assert_eq!(session.stage(), Stage::Aborted);
        assert_eq!(store.calls, ["read", "close"]);
        assert!(session.document_path().unwrap().exists());
    }

    #[test]
    fn malformed_edit_aborts_without_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", PRESS_J);
        let editor = ScriptedEditor::new(|t: &str| format!("{t}KEY_DOWN NoSuchKey\n"));
        let mut session = EditSession::new("m", options(&dir, false));

        let err = session.run(&mut store, &editor, keycode_index()).unwrap_err();
        let SessionError::MalformedEdit { path, source } = &err else {
            panic!("expected MalformedEdit, got {err:?}");
        };
        assert_eq!(source.root(), &CodecError::UnknownKeycode("NoSuchKey".into()));
        assert_eq!(Some(path.as_path()), session.document_path());
        // The operator's broken edit is still there to fix
        assert!(std::fs::read_to_string(path).unwrap().contains("NoSuchKey"));
        assert_eq!(store.calls, ["read", "close"]);
        assert_eq!(session.stage(), Stage::Aborted);
    }

    #[test]
    fn missing_macro_closes_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", PRESS_J);
        let editor = ScriptedEditor::new(str::to_string);
        let mut session = EditSession::new("other", options(&dir, false));

        let err = session.run(&mut store, &editor, keycode_index()).unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::MacroNotFound { .. })));
        assert_eq!(store.calls, ["read", "close"]);
        assert!(session.document_path().is_none());
        assert!(editor.seen.borrow().is_none());
    }

    #[test]
    fn ambiguous_macro_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", PRESS_J);
        store.rows.push(("m".to_string(), "[]".to_string()));
        let editor = ScriptedEditor::new(str::to_string);
        let mut session = EditSession::new("m", options(&dir, false));

        let err = session.run(&mut store, &editor, keycode_index()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Store(StoreError::AmbiguousMacroName { rows: 2, .. })
        ));
    }

    #[test]
    fn undecodable_stored_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = MemoryStore::with("m", "[2,13,0,3]");
        let editor = ScriptedEditor::new(str::to_string);
        let mut session = EditSession::new("m", options(&dir, false));

        let err = session.run(&mut store, &editor, keycode_index()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidStoredMacro {
                source: CodecError::MalformedMacro(_),
                ..
            }
        ));
        assert!(editor.seen.borrow().is_none());
    }
}
