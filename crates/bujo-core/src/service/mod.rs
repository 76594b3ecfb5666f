//! Domain services.
//!
//! Services borrow an open [`crate::storage::Database`]; they never open or
//! close it themselves. Each state-changing call is one IMMEDIATE
//! transaction holding its validating reads and its writes.

pub mod journal;
pub mod lists;

pub use journal::JournalService;
pub use lists::{ArchiveReport, ListOverview, ListService};
