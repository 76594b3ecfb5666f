//! Stack-based tree builder.
//!
//! Consumes classified lines in input order and resolves parent links in a
//! single pass. The stack holds the currently open ancestors; a line at
//! depth `d` pops everything at depth `>= d` and becomes a child of what is
//! left on top.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::tokenizer::ClassifiedLine;
use crate::clock::now_utc;
use crate::entry::{EntityId, Entry, ParentAnchor};
use crate::error::{ParseError, ParseErrorKind};

struct OpenAncestor {
    depth: usize,
    entity_id: EntityId,
}

/// Build entries for one logging batch.
///
/// With an anchor, batch depth 0 attaches under the anchor and absolute
/// depths are offset by `anchor.depth + 1`.
pub fn build_tree(
    lines: &[ClassifiedLine],
    date: NaiveDate,
    anchor: Option<&ParentAnchor>,
) -> Result<Vec<Entry>, ParseError> {
    let created_at = now_utc();
    let base_depth = anchor.map_or(0, |a| a.depth + 1);
    let mut stack: Vec<OpenAncestor> = Vec::new();
    let mut previous: Option<usize> = None;
    let mut entries = Vec::with_capacity(lines.len());

    for line in lines {
        let depth = line.depth;
        match previous {
            None if depth > 0 => {
                return Err(ParseError::new(
                    line.line_no,
                    ParseErrorKind::OrphanChild { depth },
                ))
            }
            Some(prev) if depth > prev + 1 => {
                return Err(ParseError::new(
                    line.line_no,
                    ParseErrorKind::IndentationJump {
                        previous: prev,
                        depth,
                    },
                ))
            }
            _ => {}
        }

        while stack.last().is_some_and(|open| open.depth >= depth) {
            stack.pop();
        }

        let parent_id = if depth == 0 {
            anchor.map(|a| a.entity_id.clone())
        } else {
            match stack.last() {
                Some(open) if open.depth + 1 == depth => Some(open.entity_id.clone()),
                _ => {
                    return Err(ParseError::new(
                        line.line_no,
                        ParseErrorKind::OrphanChild { depth },
                    ))
                }
            }
        };

        let entity_id = EntityId::new();
        stack.push(OpenAncestor {
            depth,
            entity_id: entity_id.clone(),
        });
        previous = Some(depth);

        entries.push(Entry {
            id: None,
            entity_id,
            entry_type: line.entry_type,
            content: line.content.clone(),
            priority: line.priority,
            parent_id,
            depth: base_depth + depth as u32,
            position: entries.len() as u32,
            date,
            scheduled_date: None,
            location: None,
            created_at,
            tags: line.tags.clone(),
            mentions: line.mentions.clone(),
        });
    }

    Ok(entries)
}

/// Arrange entries in depth-first display order.
///
/// Roots are entries whose parent is absent from the slice; siblings are
/// ordered by `position`, then by row id.
pub fn pre_order(entries: Vec<Entry>) -> Vec<Entry> {
    let known: std::collections::HashSet<EntityId> =
        entries.iter().map(|e| e.entity_id.clone()).collect();
    let mut roots = Vec::new();
    let mut children: HashMap<EntityId, Vec<Entry>> = HashMap::new();

    for entry in entries {
        match &entry.parent_id {
            Some(parent) if known.contains(parent) => {
                children.entry(parent.clone()).or_default().push(entry)
            }
            _ => roots.push(entry),
        }
    }

    let sort = |v: &mut Vec<Entry>| v.sort_by_key(|e| (e.date, e.position, e.id));
    sort(&mut roots);
    for siblings in children.values_mut() {
        sort(siblings);
    }

    let mut out = Vec::new();
    let mut pending: Vec<Entry> = roots.into_iter().rev().collect();
    while let Some(entry) = pending.pop() {
        if let Some(mut kids) = children.remove(&entry.entity_id) {
            while let Some(kid) = kids.pop() {
                pending.push(kid);
            }
        }
        out.push(entry);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryType, Priority};
    use std::collections::BTreeSet;

    fn line(line_no: usize, depth: usize, content: &str) -> ClassifiedLine {
        ClassifiedLine {
            line_no,
            depth,
            entry_type: EntryType::Task,
            priority: Priority::None,
            content: content.into(),
            tags: BTreeSet::new(),
            mentions: BTreeSet::new(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn siblings_after_a_subtree_attach_to_the_right_parent() {
        let lines = vec![
            line(1, 0, "a"),
            line(2, 1, "a.1"),
            line(3, 2, "a.1.i"),
            line(4, 1, "a.2"),
            line(5, 0, "b"),
        ];
        let entries = build_tree(&lines, day(), None).unwrap();
        let id = |i: usize| Some(entries[i].entity_id.clone());

        assert_eq!(entries[0].parent_id, None);
        assert_eq!(entries[1].parent_id, id(0));
        assert_eq!(entries[2].parent_id, id(1));
        assert_eq!(entries[3].parent_id, id(0));
        assert_eq!(entries[4].parent_id, None);
        assert_eq!(
            entries.iter().map(|e| e.depth).collect::<Vec<_>>(),
            vec![0, 1, 2, 1, 0]
        );
        assert_eq!(
            entries.iter().map(|e| e.position).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn first_line_nested_is_an_orphan() {
        let err = build_tree(&[line(1, 1, "orphan")], day(), None).unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, ParseErrorKind::OrphanChild { depth: 1 });
    }

    #[test]
    fn skipping_a_level_is_rejected() {
        let lines = vec![line(1, 0, "a"), line(2, 2, "too deep")];
        let err = build_tree(&lines, day(), None).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            ParseErrorKind::IndentationJump {
                previous: 0,
                depth: 2
            }
        );
    }

    #[test]
    fn anchor_seeds_a_synthetic_root() {
        let anchor = ParentAnchor {
            entity_id: EntityId::from("existing"),
            depth: 1,
        };
        let lines = vec![line(1, 0, "child"), line(2, 1, "grandchild"), line(3, 0, "child 2")];
        let entries = build_tree(&lines, day(), Some(&anchor)).unwrap();

        assert_eq!(entries[0].parent_id, Some(EntityId::from("existing")));
        assert_eq!(entries[0].depth, 2);
        assert_eq!(entries[1].parent_id, Some(entries[0].entity_id.clone()));
        assert_eq!(entries[1].depth, 3);
        assert_eq!(entries[2].parent_id, Some(EntityId::from("existing")));
    }

    #[test]
    fn builder_keeps_no_state_between_calls() {
        let first = build_tree(&[line(1, 0, "a"), line(2, 1, "b")], day(), None).unwrap();
        let second = build_tree(&[line(1, 0, "c")], day(), None).unwrap();
        assert_eq!(second[0].parent_id, None);
        assert_eq!(second[0].position, 0);
        assert_ne!(first[0].entity_id, second[0].entity_id);
    }

    #[test]
    fn pre_order_places_late_children_under_their_parent() {
        let mut entries = build_tree(
            &[line(1, 0, "question"), line(2, 0, "other")],
            day(),
            None,
        )
        .unwrap();
        let mut answer = Entry::new(EntryType::Note, "answer", day());
        answer.parent_id = Some(entries[0].entity_id.clone());
        answer.depth = 1;
        answer.position = 2;
        entries.push(answer);

        let ordered: Vec<_> = pre_order(entries)
            .into_iter()
            .map(|e| e.content)
            .collect();
        assert_eq!(ordered, vec!["question", "answer", "other"]);
    }
}
