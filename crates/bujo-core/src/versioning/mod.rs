//! Bitemporal version history for list items.
//!
//! Every semantic change to an item closes its open version and opens a
//! new one, so the full history can be read back and restored. Rows are
//! immutable once written apart from `valid_to`, which is set exactly once
//! when the version closes.
//!
//! ```text
//!   v1 [t0, t1)   v2 [t1, t2)   v3 [t3, -)
//!   ───────────── ───────────── ······ ─────────>
//!                              deleted  restored
//! ```

pub mod repository;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{EntityId, EntryType};

pub use repository::{MemoryRepository, VersionRepository};
pub use store::{
    archive, archive_preview, create_item, current_version, delete_item, history, list_summary,
    live_version, restore, revert, revise_item,
};

/// One stored version of a list item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVersion {
    pub row_id: i64,
    pub entity_id: EntityId,
    pub version: u32,
    pub list_id: EntityId,
    pub item_type: EntryType,
    pub content: String,
    pub valid_from: DateTime<Utc>,
    /// `None` while this is the current version
    pub valid_to: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ItemVersion {
    pub fn is_open(&self) -> bool {
        self.valid_to.is_none()
    }
}

/// A version about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVersion {
    pub entity_id: EntityId,
    pub version: u32,
    pub list_id: EntityId,
    pub item_type: EntryType,
    pub content: String,
    pub valid_from: DateTime<Utc>,
}

/// Fields to change on an item. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMutation {
    pub content: Option<String>,
    pub item_type: Option<EntryType>,
    pub list_id: Option<EntityId>,
}

impl ItemMutation {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn item_type(item_type: EntryType) -> Self {
        Self {
            item_type: Some(item_type),
            ..Self::default()
        }
    }

    pub fn move_to(list_id: EntityId) -> Self {
        Self {
            list_id: Some(list_id),
            ..Self::default()
        }
    }

    /// True when applying this mutation to `version` would change nothing.
    pub fn is_noop_for(&self, version: &ItemVersion) -> bool {
        self.content.as_deref().map_or(true, |c| c == version.content)
            && self.item_type.map_or(true, |t| t == version.item_type)
            && self.list_id.as_ref().map_or(true, |l| *l == version.list_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Current,
    Historical,
    /// Closed without a successor
    Deleted,
}

/// A version annotated with its status, as returned by [`history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub version: ItemVersion,
    pub status: VersionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSummary {
    pub list_id: EntityId,
    pub total: u64,
    pub done: u64,
}
