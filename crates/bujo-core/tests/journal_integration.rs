//! Integration tests for journal logging, lifecycle commands and
//! delete/restore against an on-disk database.

use bujo_core::{
    format_entries, parse_journal_text, ChildPolicy, CoreError, Database, EntityId, EntryType,
    JournalService, LifecycleCommand, ParentAnchor, ParseOptions, Priority,
};
use chrono::NaiveDate;
use indoc::indoc;
use tempfile::TempDir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

fn open_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(&dir.path().join("bujo.db")).unwrap();
    (dir, db)
}

fn contents(entries: &[bujo_core::Entry]) -> Vec<&str> {
    entries.iter().map(|e| e.content.as_str()).collect()
}

#[test]
fn test_log_and_read_back_a_day() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);

    let logged = journal
        .log_entries(". Buy milk\n  - at the corner shop\n. Pay rent", day(1), None)
        .unwrap();
    assert_eq!(logged.len(), 3);

    let day_one = journal.entries_for_date(day(1)).unwrap();
    assert_eq!(contents(&day_one), vec!["Buy milk", "at the corner shop", "Pay rent"]);
    assert_eq!(day_one[1].parent_id, Some(day_one[0].entity_id.clone()));
    assert_eq!(day_one[1].depth, 1);
    assert!(journal.entries_for_date(day(2)).unwrap().is_empty());
}

#[test]
fn test_entries_survive_reopening_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bujo.db");
    {
        let db = Database::open(&path).unwrap();
        JournalService::new(&db)
            .log_entries("o Dentist #health", day(3), None)
            .unwrap();
    }
    let db = Database::open(&path).unwrap();
    let tagged = JournalService::new(&db).entries_tagged("#health").unwrap();
    assert_eq!(contents(&tagged), vec!["Dentist"]);
}

#[test]
fn test_migrate_marks_source_and_creates_successor() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let task = journal
        .log_entries(". ! Renew passport @clerk", day(1), None)
        .unwrap()
        .remove(0);

    let transition = journal
        .apply_command(
            &task.entity_id,
            LifecycleCommand::Migrate {
                date: day(8),
                parent: None,
            },
        )
        .unwrap();

    let source = journal.entry(&task.entity_id).unwrap();
    assert_eq!(source.entry_type, EntryType::Migrated);

    let successor = transition.spawned.unwrap();
    let stored = journal.entry(&successor.entity_id).unwrap();
    assert_eq!(stored.entry_type, EntryType::Task);
    assert_eq!(stored.date, day(8));
    assert_eq!(stored.content, "Renew passport @clerk");
    assert!(stored.mentions.contains("clerk"));

    // the source is migrated, not outstanding; the successor is not before day 8
    assert!(journal.outstanding_tasks(day(8)).unwrap().is_empty());
    assert_eq!(journal.outstanding_tasks(day(9)).unwrap().len(), 1);
}

#[test]
fn test_migrate_under_explicit_parent_uses_stored_depth() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let logged = journal
        .log_entries("o Project\n  - Milestones", day(1), None)
        .unwrap();
    let task = journal.log_entries(". Draft plan", day(2), None).unwrap().remove(0);

    // depth supplied by the caller is ignored in favour of the stored one
    let anchor = ParentAnchor {
        entity_id: logged[1].entity_id.clone(),
        depth: 0,
    };
    let transition = journal
        .apply_command(
            &task.entity_id,
            LifecycleCommand::Migrate {
                date: day(5),
                parent: Some(anchor),
            },
        )
        .unwrap();
    let successor = transition.spawned.unwrap();
    assert_eq!(successor.parent_id, Some(logged[1].entity_id.clone()));
    assert_eq!(successor.depth, 2);
}

#[test]
fn test_answer_places_note_under_question() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    journal
        .log_entries(indoc! {"
            ? Which venue
            . Book caterer
        "}, day(4), None)
        .unwrap();
    let question = journal.entries_for_date(day(4)).unwrap().remove(0);

    journal
        .apply_command(
            &question.entity_id,
            LifecycleCommand::Answer {
                text: "the old library".into(),
            },
        )
        .unwrap();

    let day_four = journal.entries_for_date(day(4)).unwrap();
    assert_eq!(
        contents(&day_four),
        vec!["Which venue", "the old library", "Book caterer"]
    );
    assert_eq!(day_four[0].entry_type, EntryType::Answered);

    let reopened = journal
        .apply_command(&question.entity_id, LifecycleCommand::Reopen)
        .unwrap();
    assert_eq!(reopened.entry.entry_type, EntryType::Question);
    assert_eq!(journal.entries_for_date(day(4)).unwrap().len(), 3);
}

#[test]
fn test_answer_text_with_priority_symbol_reads_back_unchanged() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let question = journal.log_entries("? Where is the API key", day(5), None).unwrap().remove(0);
    journal
        .apply_command(
            &question.entity_id,
            LifecycleCommand::Answer {
                text: "! see docs".into(),
            },
        )
        .unwrap();

    let options = ParseOptions::default();
    let text = format_entries(&journal.entries_for_date(day(5)).unwrap(), &options);
    assert_eq!(text, "= Where is the API key\n  - \\! see docs");

    let reparsed = parse_journal_text(&text, day(5), None, &options).unwrap();
    assert_eq!(reparsed[1].priority, Priority::None);
    assert_eq!(reparsed[1].content, "! see docs");
}

#[test]
fn test_cascade_restore_leaves_separately_deleted_children() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let logged = journal
        .log_entries(". parent\n  - child\n  - sibling", day(6), None)
        .unwrap();

    journal.delete_entry(&logged[1].entity_id, ChildPolicy::Cascade).unwrap();
    journal.delete_entry(&logged[0].entity_id, ChildPolicy::Cascade).unwrap();

    let restored = journal.restore_entry(&logged[0].entity_id).unwrap();
    assert_eq!(contents(&restored), vec!["parent", "sibling"]);
    assert_eq!(contents(&journal.entries_for_date(day(6)).unwrap()), vec!["parent", "sibling"]);
    assert_eq!(journal.deleted_entries().unwrap().len(), 1);
}

#[test]
fn test_invalid_transition_keeps_stored_state() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let event = journal.log_entries("o Concert", day(1), None).unwrap().remove(0);

    for command in [
        LifecycleCommand::MarkDone,
        LifecycleCommand::Cancel,
        LifecycleCommand::Reopen,
        LifecycleCommand::Retype(EntryType::Event),
    ] {
        let err = journal.apply_command(&event.entity_id, command).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }
    let stored = journal.entry(&event.entity_id).unwrap();
    assert_eq!(stored.entry_type, EntryType::Event);
    assert_eq!(journal.entries_for_date(day(1)).unwrap().len(), 1);
}

#[test]
fn test_cascade_delete_and_restore_subtree() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let logged = journal
        .log_entries(indoc! {"
            o Move house
              . Call movers
                - ask about boxes
            . Water plants
        "}, day(2), None)
        .unwrap();

    let plan = journal
        .delete_entry(&logged[0].entity_id, ChildPolicy::Cascade)
        .unwrap();
    assert_eq!(plan.deleted.len(), 3);
    assert_eq!(contents(&journal.entries_for_date(day(2)).unwrap()), vec!["Water plants"]);
    assert_eq!(journal.deleted_entries().unwrap().len(), 3);

    // a cascaded child cannot come back before its parent
    let err = journal.restore_entry(&logged[1].entity_id).unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let restored = journal.restore_entry(&logged[0].entity_id).unwrap();
    assert_eq!(restored.len(), 3);
    assert_eq!(journal.entries_for_date(day(2)).unwrap().len(), 4);
    assert!(journal.deleted_entries().unwrap().is_empty());
}

#[test]
fn test_reparent_delete_moves_children_up() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let logged = journal
        .log_entries(indoc! {"
            o Trip
              . Packing
                - socks
                  - wool
        "}, day(6), None)
        .unwrap();

    journal
        .delete_entry(&logged[1].entity_id, ChildPolicy::Reparent)
        .unwrap();

    let socks = journal.entry(&logged[2].entity_id).unwrap();
    assert_eq!(socks.parent_id, Some(logged[0].entity_id.clone()));
    assert_eq!(socks.depth, 1);
    let wool = journal.entry(&logged[3].entity_id).unwrap();
    assert_eq!(wool.parent_id, Some(logged[2].entity_id.clone()));
    assert_eq!(wool.depth, 2);

    assert_eq!(
        contents(&journal.entries_for_date(day(6)).unwrap()),
        vec!["Trip", "socks", "wool"]
    );
}

#[test]
fn test_delete_and_restore_edge_cases() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    let note = journal.log_entries("- scratch", day(1), None).unwrap().remove(0);

    let missing = EntityId::from("missing");
    assert!(matches!(
        journal.delete_entry(&missing, ChildPolicy::Cascade),
        Err(CoreError::NotFound { .. })
    ));
    assert!(matches!(
        journal.restore_entry(&note.entity_id),
        Err(CoreError::Conflict(_))
    ));

    journal.delete_entry(&note.entity_id, ChildPolicy::Cascade).unwrap();
    let again = journal.delete_entry(&note.entity_id, ChildPolicy::Cascade).unwrap();
    assert!(again.deleted.is_empty());
}

#[test]
fn test_mentions_are_searchable() {
    let (_dir, db) = open_db();
    let journal = JournalService::new(&db);
    journal
        .log_entries("- lunch with @maria\n- email me@example.com", day(1), None)
        .unwrap();
    assert_eq!(contents(&journal.entries_mentioning("maria").unwrap()), vec!["lunch with @maria"]);
    assert!(journal.entries_mentioning("example").unwrap().is_empty());
}
