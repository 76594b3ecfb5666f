//! # Bujo Core Library
//!
//! This library provides the core logic for a bullet-journal tool. The CLI
//! binary is a thin layer that owns the database handle and calls into
//! the services defined here.
//!
//! ## Architecture
//!
//! - **Parser**: turns indented journal text into a tree of typed entries
//! - **Lifecycle**: the closed state machine over entry types
//! - **Versioning**: bitemporal history for list items (soft delete,
//!   restore, point-in-time history, archival)
//! - **Storage**: SQLite repositories and TOML-based configuration
//! - **Services**: transactional operations over journal entries and lists
//!
//! ## Key Components
//!
//! - [`parse_journal_text`]: Text to entry tree
//! - [`apply_lifecycle_command`]: Entry state transitions
//! - [`JournalService`] / [`ListService`]: Persisted operations
//! - [`Database`]: SQLite store handle
//! - [`Config`]: Application configuration management

pub mod clock;
pub mod entry;
pub mod error;
pub mod lifecycle;
pub mod parser;
pub mod service;
pub mod storage;
pub mod versioning;

pub use entry::{EntityId, Entry, EntryType, ParentAnchor, Priority};
pub use error::{
    ConfigError, CoreError, DatabaseError, ParseError, ParseErrorKind, Result, ValidationError,
};
pub use lifecycle::{apply_lifecycle_command, ChildPolicy, DeletePlan, LifecycleCommand, Transition};
pub use parser::{format_entries, parse_journal_text, ParseOptions};
pub use service::{ArchiveReport, JournalService, ListOverview, ListService};
pub use storage::entry_repo::DeletedEntry;
pub use storage::{Config, Database, ListRecord};
pub use versioning::{HistoryEntry, ItemMutation, ItemVersion, ListSummary, VersionStatus};
