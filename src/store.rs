//! Macro storage: the ObinsKit SQLite database.
//!
//! The session only needs to read and write one `macro_value` by macro
//! name, inside a transaction that is committed explicitly. Anything left
//! uncommitted when the store is closed (or dropped) is rolled back.

use crate::config::StoreConfig;
use rusqlite::{params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from macro storage
#[derive(Error, Debug)]
pub enum StoreError {
    /// No row carries this macro name
    #[error("Macro not found: \"{name}\" (known macros: {})", .known.join(", "))]
    MacroNotFound { name: String, known: Vec<String> },

    /// More than one row carries this macro name
    #[error("Ambiguous macro name: \"{name}\" matches {rows} rows, expected exactly one")]
    AmbiguousMacroName { name: String, rows: usize },

    /// Configured table/column name is not a plain SQL identifier
    #[error("Invalid SQL identifier: \"{0}\"")]
    InvalidIdentifier(String),

    /// Store used after `close()`
    #[error("Store is closed")]
    Closed,

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error (working copy)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read/write access to stored macros by name
pub trait MacroStore {
    /// Raw stored `macro_value` text for exactly one macro
    fn read_macro(&mut self, name: &str) -> Result<String, StoreError>;

    /// Replace the stored `macro_value` of exactly one macro
    fn write_macro(&mut self, name: &str, raw: &str) -> Result<(), StoreError>;

    /// Make all writes so far durable
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Roll back anything uncommitted and release the store. Idempotent.
    fn close(&mut self) -> Result<(), StoreError>;
}

/// SQLite-backed macro store
pub struct SqliteStore {
    conn: Option<Connection>,
    path: PathBuf,
    config: StoreConfig,
    in_transaction: bool,
}

impl SqliteStore {
    /// Open an existing database and begin a transaction.
    pub fn open(path: &Path, config: StoreConfig) -> Result<Self, StoreError> {
        if let Some(ident) = config.invalid_identifier() {
            return Err(StoreError::InvalidIdentifier(ident.to_string()));
        }

        debug!("Opening SQLite db at {}", path.display());
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        conn.execute_batch("BEGIN")?;

        Ok(Self {
            conn: Some(conn),
            path: path.to_path_buf(),
            config,
            in_transaction: true,
        })
    }

    /// Path of the opened database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::Closed)
    }

    /// Names of all stored macros, sorted
    pub fn list_macros(&self) -> Result<Vec<String>, StoreError> {
        let StoreConfig {
            table, name_column, ..
        } = &self.config;
        let sql = format!("SELECT {name_column} FROM {table} ORDER BY {name_column}");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

impl MacroStore for SqliteStore {
    fn read_macro(&mut self, name: &str) -> Result<String, StoreError> {
        let StoreConfig {
            table,
            name_column,
            value_column,
        } = &self.config;
        let sql = format!("SELECT {value_column} FROM {table} WHERE {name_column} = ?1");
        debug!("Selecting macro_value with: {sql} [{name}]");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut values = stmt
            .query_map(params![name], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        match values.len() {
            0 => Err(StoreError::MacroNotFound {
                name: name.to_string(),
                known: self.list_macros()?,
            }),
            1 => Ok(values.remove(0)),
            rows => Err(StoreError::AmbiguousMacroName {
                name: name.to_string(),
                rows,
            }),
        }
    }

    fn write_macro(&mut self, name: &str, raw: &str) -> Result<(), StoreError> {
        let StoreConfig {
            table,
            name_column,
            value_column,
        } = &self.config;
        let sql = format!("UPDATE {table} SET {value_column} = ?1 WHERE {name_column} = ?2");
        debug!("Updating macro_value with: {sql} [{raw}, {name}]");

        let rows = self.conn()?.execute(&sql, params![raw, name])?;
        match rows {
            0 => Err(StoreError::MacroNotFound {
                name: name.to_string(),
                known: self.list_macros()?,
            }),
            1 => Ok(()),
            rows => Err(StoreError::AmbiguousMacroName {
                name: name.to_string(),
                rows,
            }),
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_transaction {
            self.conn()?.execute_batch("COMMIT")?;
            self.in_transaction = false;
            debug!("Committed SQLite transaction on {}", self.path.display());
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StoreError> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        if self.in_transaction {
            self.in_transaction = false;
            conn.execute_batch("ROLLBACK")?;
            debug!("Rolled back uncommitted changes on {}", self.path.display());
        }
        conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
        debug!("Closed SQLite db at {}", self.path.display());
        Ok(())
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close SQLite db at {}: {e}", self.path.display());
        }
    }
}
