
use predicates::prelude::*;
use tempfile::TempDir;
use test_helpers::lectio_command;

fn add(temp_dir: &TempDir, args: &[&str]) {
    lectio_command(&temp_dir.path().join("journal.db"))
        .arg("add")
        .args(args)
        .assert()
        .success();
}

#[test]
fn test_cli_no_args_prints_usage() {
    let temp_dir = TempDir::new().unwrap();

    lectio_command(&temp_dir.path().join("journal.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_add_and_list() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("journal.db");

    lectio_command(&db_path)
        .args(["add", "john", "3", "--verse-start", "16", "-r", "God so loved"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved entry #1 (John 3)"));

    lectio_command(&db_path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 John 3:16"));
}

#[test]
fn test_cli_show_prints_reflections_and_notes() {
    let temp_dir = TempDir::new().unwrap();
    add(&temp_dir, &["Psalms", "23", "-r", "rest", "-n", "still waters"]);

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reflection 1:\nrest"))
        .stdout(predicate::str::contains("Notes:\nstill waters"));
}

#[test]
fn test_cli_edit_keeps_unchanged_fields() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("journal.db");
    add(&temp_dir, &["Mark", "1", "-n", "baptism"]);

    lectio_command(&db_path)
        .args(["edit", "1", "--to", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated entry #1"));

    lectio_command(&db_path)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#1 Mark 1-2"))
        .stdout(predicate::str::contains("baptism"));
}

#[test]
fn test_cli_search_and_delete() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("journal.db");
    add(&temp_dir, &["Ruth", "1", "-r", "Where you go I will go"]);
    add(&temp_dir, &["Esther", "4", "-r", "for such a time"]);

    lectio_command(&db_path)
        .args(["search", "SUCH A TIME"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Esther 4"))
        .stdout(predicate::str::contains("Ruth").not());

    lectio_command(&db_path)
        .args(["delete", "2"])
        .assert()
        .success();

    lectio_command(&db_path)
        .args(["search", "time"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching entries."));
}

#[test]
fn test_cli_missing_entry_exits_with_error() {
    let temp_dir = TempDir::new().unwrap();

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["delete", "7"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Entry not found"));
}

#[test]
fn test_cli_unknown_book_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["add", "Hezekiah", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown book 'Hezekiah'"));
}

#[test]
fn test_cli_chapter_beyond_book_is_rejected() {
    let temp_dir = TempDir::new().unwrap();

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["add", "Jude", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Jude has only 1 chapters"));
}

#[test]
fn test_cli_today_reports_through_exit_code() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("journal.db");

    lectio_command(&db_path)
        .arg("today")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No entry yet today."));

    add(&temp_dir, &["Acts", "2"]);

    lectio_command(&db_path).arg("today").assert().success();
}

#[test]
fn test_cli_stats_json() {
    let temp_dir = TempDir::new().unwrap();
    add(&temp_dir, &["Genesis", "1"]);
    add(&temp_dir, &["Exodus", "1"]);

    let output = lectio_command(&temp_dir.path().join("journal.db"))
        .args(["stats", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total_entries"], 2);
    assert_eq!(summary["has_entry_today"], true);
    assert_eq!(summary["current_streak"], 1);
    assert_eq!(summary["books_read"], 2);
}

#[test]
fn test_cli_export_then_import() {
    let temp_dir = TempDir::new().unwrap();
    let backup_path = temp_dir.path().join("backup.json");
    add(&temp_dir, &["Jonah", "1"]);
    add(&temp_dir, &["Jonah", "2", "--to", "4"]);

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["export", "-o"])
        .arg(&backup_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 2 entries"));

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["import", "--dry-run"])
        .arg(&backup_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid backup with 2 entries"));

    let fresh_db = temp_dir.path().join("fresh.db");
    lectio_command(&fresh_db)
        .arg("import")
        .arg(&backup_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 entries restored"));

    lectio_command(&fresh_db)
        .arg("import")
        .arg(&backup_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 entries restored"))
        .stdout(predicate::str::contains("2 duplicates skipped"));
}

#[test]
fn test_cli_export_defaults_to_backup_dir() {
    let temp_dir = TempDir::new().unwrap();
    add(&temp_dir, &["Amos", "5"]);

    lectio_command(&temp_dir.path().join("journal.db"))
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("lectio-backup-"));
}

#[test]
fn test_cli_dry_run_rejects_invalid_backup() {
    let temp_dir = TempDir::new().unwrap();
    let bad = temp_dir.path().join("bad.json");
    std::fs::write(&bad, r#"{"version": "1.0", "entries": []}"#).unwrap();

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["import", "--dry-run"])
        .arg(&bad)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid backup"));
}

#[test]
fn test_cli_books_lists_canon() {
    let temp_dir = TempDir::new().unwrap();

    lectio_command(&temp_dir.path().join("journal.db"))
        .arg("books")
        .assert()
        .success()
        .stdout(predicate::str::contains("Old Testament"))
        .stdout(predicate::str::contains("Revelation"));
}

#[test]
fn test_cli_json_log_format_is_accepted() {
    let temp_dir = TempDir::new().unwrap();

    lectio_command(&temp_dir.path().join("journal.db"))
        .args(["--log-format", "json", "books"])
        .assert()
        .success();
}
