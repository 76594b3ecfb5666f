//! Core error types for bujo-core.
//!
//! This module defines the error hierarchy shared by the parser, the entry
//! lifecycle, the versioned item store and the SQLite-backed services.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::entry::EntryType;

/// Core error type for bujo-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed journal text (always line-addressed)
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Lifecycle command not legal for the entry's current type
    #[error("Invalid transition: {command} is not allowed on a {current} entry")]
    InvalidTransition { current: EntryType, command: String },

    /// Entity or version absent
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation attempted against a state that forbids it
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backing store failure (not a domain error)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl fmt::Display) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict(message.into())
    }
}

/// A journal text line that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number in the submitted text
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

/// Why a line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unrecognized entry symbol {0:?}")]
    UnrecognizedSymbol(String),

    #[error("illegal indentation: {0}")]
    IllegalIndentation(String),

    #[error("cannot skip nesting levels (depth {depth} follows depth {previous})")]
    IndentationJump { previous: usize, depth: usize },

    #[error("orphaned child at depth {depth} with no preceding root")]
    OrphanChild { depth: usize },

    #[error("entry has no content")]
    EmptyContent,
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked or busy
    #[error("Database is locked")]
    Locked,

    /// A stored value could not be decoded
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty value where content is required
    #[error("Empty value for '{0}'")]
    Empty(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => match inner.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::StorageUnavailable(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_line_and_reason() {
        let err = ParseError::new(3, ParseErrorKind::OrphanChild { depth: 2 });
        assert_eq!(
            err.to_string(),
            "line 3: orphaned child at depth 2 with no preceding root"
        );
    }

    #[test]
    fn invalid_transition_names_type_and_command() {
        let err = CoreError::InvalidTransition {
            current: EntryType::Note,
            command: "mark-done".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid transition: mark-done is not allowed on a note entry"
        );
    }

    #[test]
    fn busy_sqlite_maps_to_locked() {
        let err = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            None,
        );
        assert!(matches!(DatabaseError::from(err), DatabaseError::Locked));
    }
}
