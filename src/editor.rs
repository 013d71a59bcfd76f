//! External editor support.
//!
//! The editor is a blocking step: launch it on a file, wait for it to exit,
//! report the exit status. There is no timeout; the operator decides when
//! editing is done.

use std::path::Path;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors launching the external editor
#[derive(Debug, Error)]
pub enum EditorError {
    /// Editor command line is empty
    #[error("No editor configured. Set $VISUAL or $EDITOR, or pass --editor.")]
    NoEditor,

    /// Editor binary not found
    #[error("Editor command not found: {0}")]
    NotFound(String),

    /// Failed to spawn the editor process
    #[error("Failed to spawn editor {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Something that lets the operator edit a file in place
pub trait Editor {
    /// Edit `path`, blocking until done. Returns the exit status
    /// (0 = success; -1 if the process was killed by a signal).
    fn run(&self, path: &Path) -> Result<i32, EditorError>;
}

/// Fallback when neither the config nor the environment names an editor
pub const DEFAULT_EDITOR: &str = "vi";

/// An editor launched as a child process, file path appended last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEditor {
    program: String,
    args: Vec<String>,
}

impl CommandEditor {
    /// Split a command line such as `code --wait` on whitespace.
    pub fn from_command_line(cmdline: &str) -> Result<Self, EditorError> {
        let mut parts = cmdline.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(EditorError::NoEditor)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Pick the editor: explicit choice, then `$VISUAL`, then `$EDITOR`,
    /// then [`DEFAULT_EDITOR`].
    pub fn resolve(explicit: Option<&str>) -> Result<Self, EditorError> {
        let from_env = |var: &str| std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        let cmdline = explicit
            .map(str::to_string)
            .or_else(|| from_env("VISUAL"))
            .or_else(|| from_env("EDITOR"))
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self::from_command_line(&cmdline)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Editor for CommandEditor {
    fn run(&self, path: &Path) -> Result<i32, EditorError> {
        debug!("Launching editor: {} {:?} {}", self.program, self.args, path.display());
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EditorError::NotFound(self.program.clone())
                } else {
                    EditorError::SpawnFailed {
                        command: self.program.clone(),
                        source: e,
                    }
                }
            })?;
        debug!("Editor exited with {status}");
        Ok(status.code().unwrap_or(-1))
    }
}
