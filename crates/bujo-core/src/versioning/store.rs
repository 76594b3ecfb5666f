//! Version store operations.
//!
//! Each function takes the repository and the caller's `now`; wrapping a
//! call in a transaction is the caller's job. A version is closed at
//! `max(now, valid_from)` so intervals never run backwards.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{HistoryEntry, ItemMutation, ItemVersion, ListSummary, NewVersion, VersionRepository, VersionStatus};
use crate::entry::{EntityId, EntryType};
use crate::error::{CoreError, Result, ValidationError};

const ITEM: &str = "list item";

fn validated_content(content: &str) -> Result<String> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::Empty("content".into()).into());
    }
    Ok(content.to_string())
}

fn close_at(version: &ItemVersion, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(version.valid_from)
}

/// Open version of an item that must be live.
///
/// A deleted item is a `Conflict`; an item that never existed is `NotFound`.
pub fn live_version<R: VersionRepository + ?Sized>(repo: &R, entity: &EntityId) -> Result<ItemVersion> {
    match repo.current(entity)? {
        Some(current) => Ok(current),
        None if repo.query(entity)?.is_empty() => Err(CoreError::not_found(ITEM, entity)),
        None => Err(CoreError::conflict(format!("list item {entity} is deleted"))),
    }
}

/// Create a new item as version 1.
pub fn create_item<R: VersionRepository + ?Sized>(
    repo: &R,
    list: &EntityId,
    item_type: EntryType,
    content: &str,
    now: DateTime<Utc>,
) -> Result<ItemVersion> {
    let created = repo.put(NewVersion {
        entity_id: EntityId::new(),
        version: 1,
        list_id: list.clone(),
        item_type,
        content: validated_content(content)?,
        valid_from: now,
    })?;
    info!(entity = %created.entity_id, list = %list, "created list item");
    Ok(created)
}

pub fn current_version<R: VersionRepository + ?Sized>(repo: &R, entity: &EntityId) -> Result<ItemVersion> {
    repo.current(entity)?
        .ok_or_else(|| CoreError::not_found(ITEM, entity))
}

/// Close the current version and open the next one with `mutation` applied.
///
/// A mutation that changes nothing writes nothing and returns the current
/// version.
pub fn revise_item<R: VersionRepository + ?Sized>(
    repo: &R,
    entity: &EntityId,
    mutation: &ItemMutation,
    now: DateTime<Utc>,
) -> Result<ItemVersion> {
    let current = live_version(repo, entity)?;
    let content = match &mutation.content {
        Some(c) => validated_content(c)?,
        None => current.content.clone(),
    };
    let normalized = ItemMutation {
        content: Some(content),
        ..mutation.clone()
    };
    if normalized.is_noop_for(&current) {
        debug!(entity = %entity, "revision changes nothing");
        return Ok(current);
    }

    let at = close_at(&current, now);
    repo.close_version(current.row_id, at)?;
    let next = repo.put(NewVersion {
        entity_id: entity.clone(),
        version: current.version + 1,
        list_id: normalized.list_id.unwrap_or(current.list_id),
        item_type: normalized.item_type.unwrap_or(current.item_type),
        content: normalized.content.unwrap_or(current.content),
        valid_from: at,
    })?;
    info!(entity = %entity, version = next.version, "revised list item");
    Ok(next)
}

/// Close the current version without a successor.
///
/// Deleting an already deleted item succeeds without writing.
pub fn delete_item<R: VersionRepository + ?Sized>(
    repo: &R,
    entity: &EntityId,
    now: DateTime<Utc>,
) -> Result<()> {
    match repo.current(entity)? {
        Some(current) => {
            repo.close_version(current.row_id, close_at(&current, now))?;
            info!(entity = %entity, version = current.version, "deleted list item");
            Ok(())
        }
        None if repo.query(entity)?.is_empty() => Err(CoreError::not_found(ITEM, entity)),
        None => {
            debug!(entity = %entity, "list item already deleted");
            Ok(())
        }
    }
}

/// All versions of an item, oldest first.
pub fn history<R: VersionRepository + ?Sized>(repo: &R, entity: &EntityId) -> Result<Vec<HistoryEntry>> {
    let versions = repo.query(entity)?;
    if versions.is_empty() {
        return Err(CoreError::not_found(ITEM, entity));
    }
    let last = versions.len() - 1;
    Ok(versions
        .into_iter()
        .enumerate()
        .map(|(idx, version)| {
            let status = match (version.is_open(), idx == last) {
                (true, _) => VersionStatus::Current,
                (false, true) => VersionStatus::Deleted,
                (false, false) => VersionStatus::Historical,
            };
            HistoryEntry { version, status }
        })
        .collect())
}

fn target_version(versions: &[ItemVersion], entity: &EntityId, target: u32) -> Result<ItemVersion> {
    versions
        .iter()
        .find(|v| v.version == target)
        .cloned()
        .ok_or_else(|| CoreError::not_found("item version", format!("{entity} v{target}")))
}

/// Bring a deleted item back as a copy of `target`.
///
/// The restored version is numbered after the last stored version, so
/// history stays gapless.
pub fn restore<R: VersionRepository + ?Sized>(
    repo: &R,
    entity: &EntityId,
    target: u32,
    now: DateTime<Utc>,
) -> Result<ItemVersion> {
    let versions = repo.query(entity)?;
    let Some(last) = versions.last() else {
        return Err(CoreError::not_found(ITEM, entity));
    };
    if last.is_open() {
        return Err(CoreError::conflict(format!(
            "list item {entity} is not deleted"
        )));
    }
    let source = target_version(&versions, entity, target)?;
    let valid_from = last.valid_to.map_or(now, |closed| now.max(closed));

    let restored = repo.put(NewVersion {
        entity_id: entity.clone(),
        version: last.version + 1,
        list_id: source.list_id,
        item_type: source.item_type,
        content: source.content,
        valid_from,
    })?;
    info!(entity = %entity, from = target, version = restored.version, "restored list item");
    Ok(restored)
}

/// Revise a live item back to the fields of an earlier version.
pub fn revert<R: VersionRepository + ?Sized>(
    repo: &R,
    entity: &EntityId,
    target: u32,
    now: DateTime<Utc>,
) -> Result<ItemVersion> {
    live_version(repo, entity)?;
    let source = target_version(&repo.query(entity)?, entity, target)?;
    revise_item(
        repo,
        entity,
        &ItemMutation {
            content: Some(source.content),
            item_type: Some(source.item_type),
            list_id: Some(source.list_id),
        },
        now,
    )
}

/// Physically remove closed versions that ended before `cutoff`.
pub fn archive<R: VersionRepository + ?Sized>(repo: &R, cutoff: DateTime<Utc>) -> Result<u64> {
    let removed = repo.delete_closed_before(cutoff)?;
    info!(removed, %cutoff, "archived item versions");
    Ok(removed)
}

/// Number of versions [`archive`] would remove.
pub fn archive_preview<R: VersionRepository + ?Sized>(repo: &R, cutoff: DateTime<Utc>) -> Result<u64> {
    repo.count_closed_before(cutoff)
}

/// Total and done counts over the current versions in a list.
pub fn list_summary<R: VersionRepository + ?Sized>(repo: &R, list: &EntityId) -> Result<ListSummary> {
    let items = repo.current_in_list(list)?;
    let done = items
        .iter()
        .filter(|v| v.item_type == EntryType::Done)
        .count() as u64;
    Ok(ListSummary {
        list_id: list.clone(),
        total: items.len() as u64,
        done,
    })
}
