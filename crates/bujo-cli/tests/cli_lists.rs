//! List commands, end to end through the `bujo` binary.

mod common;

use common::{assert_contains, id_of, Cli};

#[test]
fn create_add_and_summarize() {
    let cli = Cli::new();
    cli.json(&["list", "create", "Groceries"]);
    cli.json(&["list", "add", "Groceries", ". eggs"]);
    let bread = cli.json(&["list", "add", "Groceries", "--content", "bread"]);
    assert_eq!(bread["item_type"], "task");
    assert_eq!(bread["version"], 1);

    cli.json(&["list", "done", &id_of(&bread)]);
    let lists = cli.json(&["list", "all"]);
    assert_eq!(lists[0]["name"], "Groceries");
    assert_eq!(lists[0]["total"], 2);
    assert_eq!(lists[0]["done"], 1);
}

#[test]
fn duplicate_list_names_conflict() {
    let cli = Cli::new();
    cli.success(&["list", "create", "Books"]);
    let stderr = cli.failure(&["list", "create", "Books"]);
    assert_contains(&stderr, "Conflict");
}

#[test]
fn history_delete_restore_and_revert() {
    let cli = Cli::new();
    cli.success(&["list", "create", "Work"]);
    let item = cli.json(&["list", "add", "Work", ". Task A"]);
    let id = id_of(&item);

    let edited = cli.json(&["list", "edit", &id, "Task B"]);
    assert_eq!(edited["version"], 2);

    cli.success(&["list", "remove", &id]);
    assert!(cli.json(&["list", "items", "Work"]).as_array().unwrap().is_empty());
    let history = cli.json(&["list", "history", &id]);
    assert_eq!(history[0]["status"], "historical");
    assert_eq!(history[1]["status"], "deleted");

    let restored = cli.json(&["list", "restore", &id, "--version", "1"]);
    assert_eq!(restored["version"], 3);
    assert_eq!(restored["content"], "Task A");

    let reverted = cli.json(&["list", "revert", &id, "--version", "2"]);
    assert_eq!(reverted["version"], 4);
    assert_eq!(reverted["content"], "Task B");

    let stderr = cli.failure(&["list", "restore", &id, "--version", "1"]);
    assert_contains(&stderr, "Conflict");
}

#[test]
fn move_between_lists_and_delete_list() {
    let cli = Cli::new();
    cli.success(&["list", "create", "Inbox"]);
    cli.success(&["list", "create", "Someday"]);
    let item = cli.json(&["list", "add", "Inbox", "- learn cello"]);
    let moved = cli.json(&["list", "move", &id_of(&item), "Someday"]);
    assert_eq!(moved["version"], 2);

    let out = cli.success(&["list", "delete", "Someday"]);
    assert_contains(&out, "1 items");
    let lists = cli.json(&["list", "all"]);
    assert_eq!(lists.as_array().unwrap().len(), 1);
}

#[test]
fn archive_dry_run_then_apply() {
    let cli = Cli::new();
    cli.success(&["list", "create", "L"]);
    let item = cli.json(&["list", "add", "L", ". a"]);
    cli.success(&["list", "edit", &id_of(&item), "b"]);

    let preview = cli.json(&["list", "archive", "--before", "2999-01-01", "--dry-run"]);
    assert_eq!(preview["versions"], 1);
    assert_eq!(preview["dry_run"], true);

    let applied = cli.json(&["list", "archive", "--before", "2999-01-01"]);
    assert_eq!(applied["versions"], 1);
    assert_eq!(cli.json(&["list", "history", &id_of(&item)]).as_array().unwrap().len(), 1);
}

#[test]
fn list_items_reject_journal_only_commands() {
    let cli = Cli::new();
    cli.success(&["list", "create", "Ideas"]);
    let note = cli.json(&["list", "add", "Ideas", "--type", "note", "--content", "shed"]);
    let stderr = cli.failure(&["list", "done", &id_of(&note)]);
    assert_contains(&stderr, "Invalid transition");

    let event = cli.json(&["list", "retype", &id_of(&note), "event"]);
    assert_eq!(event["item_type"], "event");
}
