//! Delete planning for an entry and its children.
//!
//! The caller always picks a [`ChildPolicy`]; there is no default. The plan
//! is computed up front so the store can apply it as one atomic unit.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::entry::{EntityId, Entry};

/// What happens to the children of a deleted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildPolicy {
    /// Soft-delete the whole subtree
    Cascade,
    /// Move direct children up to the deleted entry's parent
    Reparent,
}

impl fmt::Display for ChildPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildPolicy::Cascade => f.write_str("cascade"),
            ChildPolicy::Reparent => f.write_str("reparent"),
        }
    }
}

impl FromStr for ChildPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cascade" => Ok(ChildPolicy::Cascade),
            "reparent" => Ok(ChildPolicy::Reparent),
            other => Err(format!("unknown child policy: {other}")),
        }
    }
}

/// New placement for an entry that survives its ancestor's deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reparent {
    pub entity_id: EntityId,
    pub parent_id: Option<EntityId>,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeletePlan {
    /// Entities to flag as deleted, target first
    pub deleted: Vec<EntityId>,
    /// Surviving descendants whose parent or depth changes
    pub reparented: Vec<Reparent>,
}

/// Plan the deletion of `target`.
///
/// `candidates` may contain unrelated entries; only descendants of the
/// target (reached through parent links) are affected.
pub fn plan_delete(target: &Entry, candidates: &[Entry], policy: ChildPolicy) -> DeletePlan {
    let mut by_parent: HashMap<&EntityId, Vec<&Entry>> = HashMap::new();
    for entry in candidates {
        if let Some(parent) = &entry.parent_id {
            by_parent.entry(parent).or_default().push(entry);
        }
    }

    let mut plan = DeletePlan {
        deleted: vec![target.entity_id.clone()],
        reparented: Vec::new(),
    };

    let mut queue: VecDeque<&Entry> = by_parent
        .get(&target.entity_id)
        .map(|kids| kids.iter().copied().collect())
        .unwrap_or_default();

    while let Some(entry) = queue.pop_front() {
        match policy {
            ChildPolicy::Cascade => plan.deleted.push(entry.entity_id.clone()),
            ChildPolicy::Reparent => {
                let parent_id = if entry.parent_id.as_ref() == Some(&target.entity_id) {
                    target.parent_id.clone()
                } else {
                    entry.parent_id.clone()
                };
                plan.reparented.push(Reparent {
                    entity_id: entry.entity_id.clone(),
                    parent_id,
                    depth: entry.depth.saturating_sub(1),
                });
            }
        }
        if let Some(kids) = by_parent.get(&entry.entity_id) {
            queue.extend(kids.iter().copied());
        }
    }

    plan
}
