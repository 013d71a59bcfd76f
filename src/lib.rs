// ObinsKit Macro Editor - Shared Library
// Store access, editor launching, diffing and the edit session

pub mod config;
pub mod diff;
pub mod editor;
pub mod session;
pub mod store;
pub mod workspace;

pub use config::{EditConfig, StoreConfig};
pub use diff::{LineChange, LineChangeKind, MacroDiff};
pub use editor::{CommandEditor, Editor, EditorError};
pub use session::{EditSession, SessionError, SessionOptions, SessionOutcome, Stage};
pub use store::{MacroStore, SqliteStore, StoreError};
pub use workspace::WorkingCopy;
