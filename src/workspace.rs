//! Working copy of the ObinsKit database.
//!
//! Edits go to a copy in a fresh temporary directory so the live database
//! is untouched until the operator installs the result. The directory is
//! kept on every exit path.

use crate::store::StoreError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A copy of the database in its own kept temporary directory
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    source: PathBuf,
    dir: PathBuf,
    db: PathBuf,
}

impl WorkingCopy {
    /// Copy `source` into a new temporary directory under the system temp dir.
    pub fn create(source: &Path) -> Result<Self, StoreError> {
        Self::create_in(source, &std::env::temp_dir())
    }

    /// Copy `source` into a new temporary directory under `parent`.
    pub fn create_in(source: &Path, parent: &Path) -> Result<Self, StoreError> {
        let file_name = source.file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a database file path: {}", source.display()),
            )
        })?;

        let dir = tempfile::Builder::new()
            .prefix(&dir_prefix(source))
            .tempdir_in(parent)?
            .keep();
        let db = dir.join(file_name);
        std::fs::copy(source, &db)?;
        debug!(
            "Copied SQLite db at {} to working copy {}",
            source.display(),
            db.display()
        );

        Ok(Self {
            source: source.to_path_buf(),
            dir,
            db,
        })
    }

    /// The database that was copied
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Directory holding the copy
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the copied database
    pub fn db_path(&self) -> &Path {
        &self.db
    }
}

/// Temp dir prefix derived from the source path, e.g. `_home_me_Run.core-`
fn dir_prefix(source: &Path) -> String {
    let flat: String = source
        .to_string_lossy()
        .chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect();
    format!("{flat}-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_leaves_source_alone() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Run.core");
        std::fs::write(&source, b"sqlite bytes").unwrap();

        let copy = WorkingCopy::create_in(&source, dir.path()).unwrap();
        assert_ne!(copy.db_path(), source);
        assert_eq!(copy.db_path().file_name().unwrap(), "Run.core");
        assert_eq!(std::fs::read(copy.db_path()).unwrap(), b"sqlite bytes");

        std::fs::write(copy.db_path(), b"changed").unwrap();
        assert_eq!(std::fs::read(&source).unwrap(), b"sqlite bytes");
        assert!(copy.dir().starts_with(dir.path()));
    }

    #[test]
    fn prefix_flattens_separators() {
        let prefix = dir_prefix(Path::new("/home/me/Run.core"));
        assert_eq!(prefix, "_home_me_Run.core-");
    }

    #[test]
    fn missing_source_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            WorkingCopy::create_in(&dir.path().join("absent"), dir.path()),
            Err(StoreError::Io(_))
        ));
    }
}
