//! Persistence seam for item versions.

use chrono::{DateTime, Utc};
use std::cell::RefCell;

use super::{ItemVersion, NewVersion};
use crate::entry::EntityId;
use crate::error::{CoreError, Result};

/// Storage operations the version store needs.
///
/// Implementations must reject a second open version for the same entity
/// with [`CoreError::Conflict`].
pub trait VersionRepository {
    /// The open version of `entity`, if any.
    fn current(&self, entity: &EntityId) -> Result<Option<ItemVersion>>;

    /// Insert a new open version and return it with its row id.
    fn put(&self, version: NewVersion) -> Result<ItemVersion>;

    /// Set `valid_to` on an open version.
    fn close_version(&self, row_id: i64, valid_to: DateTime<Utc>) -> Result<()>;

    /// All stored versions of `entity`, ordered by version number.
    fn query(&self, entity: &EntityId) -> Result<Vec<ItemVersion>>;

    /// Remove closed versions with `valid_to < cutoff`; returns the count.
    fn delete_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    fn count_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Open versions whose list is `list`, in insertion order.
    fn current_in_list(&self, list: &EntityId) -> Result<Vec<ItemVersion>>;
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<ItemVersion>,
    next_row_id: i64,
}

/// In-memory repository for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RefCell<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored rows across all entities.
    pub fn len(&self) -> usize {
        self.state.borrow().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VersionRepository for MemoryRepository {
    fn current(&self, entity: &EntityId) -> Result<Option<ItemVersion>> {
        Ok(self
            .state
            .borrow()
            .rows
            .iter()
            .find(|v| &v.entity_id == entity && v.is_open())
            .cloned())
    }

    fn put(&self, version: NewVersion) -> Result<ItemVersion> {
        let mut state = self.state.borrow_mut();
        if state
            .rows
            .iter()
            .any(|v| v.entity_id == version.entity_id && v.is_open())
        {
            return Err(CoreError::conflict(format!(
                "item {} already has an open version",
                version.entity_id
            )));
        }
        state.next_row_id += 1;
        let stored = ItemVersion {
            row_id: state.next_row_id,
            entity_id: version.entity_id,
            version: version.version,
            list_id: version.list_id,
            item_type: version.item_type,
            content: version.content,
            valid_from: version.valid_from,
            valid_to: None,
            created_at: version.valid_from,
        };
        state.rows.push(stored.clone());
        Ok(stored)
    }

    fn close_version(&self, row_id: i64, valid_to: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let row = state
            .rows
            .iter_mut()
            .find(|v| v.row_id == row_id && v.is_open())
            .ok_or_else(|| CoreError::not_found("open version", row_id))?;
        row.valid_to = Some(valid_to);
        Ok(())
    }

    fn query(&self, entity: &EntityId) -> Result<Vec<ItemVersion>> {
        let mut versions: Vec<ItemVersion> = self
            .state
            .borrow()
            .rows
            .iter()
            .filter(|v| &v.entity_id == entity)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    fn delete_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.borrow_mut();
        let before = state.rows.len();
        state.rows.retain(|v| !v.valid_to.is_some_and(|to| to < cutoff));
        Ok((before - state.rows.len()) as u64)
    }

    fn count_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        Ok(self
            .state
            .borrow()
            .rows
            .iter()
            .filter(|v| v.valid_to.is_some_and(|to| to < cutoff))
            .count() as u64)
    }

    fn current_in_list(&self, list: &EntityId) -> Result<Vec<ItemVersion>> {
        Ok(self
            .state
            .borrow()
            .rows
            .iter()
            .filter(|v| &v.list_id == list && v.is_open())
            .cloned()
            .collect())
    }
}
