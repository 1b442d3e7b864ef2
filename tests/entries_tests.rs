//! Integration tests for the entry repository against on-disk stores.


use lectio::db::entries::{self, JournalEntryInput};
use lectio::db::Database;
use lectio::errors::{AppError, AppResult, DatabaseError};
use tempfile::TempDir;
use test_helpers::input;

#[test]
fn test_entries_survive_reopen() -> AppResult<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("journal.db");

    let id = {
        let db = Database::open(&db_path)?;
        let conn = db.get_conn()?;
        let mut new_entry = input("Romans", 8);
        new_entry.reflections = vec![Some("no condemnation".to_string())];
        entries::create_entry(&conn, &new_entry)?
    };

    let db = Database::open(&db_path)?;
    let conn = db.get_conn()?;
    let entry = entries::get_entry(&conn, id)?.expect("entry persisted");
    assert_eq!(entry.book_name, "Romans");
    assert_eq!(entry.reflections[0].as_deref(), Some("no condemnation"));
    assert_eq!(entry.reflections[3], None);
    Ok(())
}

#[test]
fn test_full_lifecycle() -> AppResult<()> {
    let db = Database::open_in_memory()?;
    let conn = db.get_conn()?;

    let id = entries::create_entry(&conn, &input("Genesis", 1))?;
    assert_eq!(entries::count_entries(&conn)?, 1);

    let replacement = JournalEntryInput {
        book_name: "Genesis".to_string(),
        chapter_start: 1,
        chapter_end: Some(2),
        notes: Some("creation".to_string()),
        ..Default::default()
    };
    entries::update_entry(&conn, id, &replacement)?;

    let updated = entries::get_entry(&conn, id)?.expect("entry exists");
    assert_eq!(JournalEntryInput::from(&updated).chapter_end, Some(2));
    assert!(updated.updated_at > updated.created_at);

    assert_eq!(entries::search_entries(&conn, "CREATION")?.len(), 1);

    entries::delete_entry(&conn, id)?;
    assert!(entries::get_entry(&conn, id)?.is_none());
    assert_eq!(entries::count_entries(&conn)?, 0);
    Ok(())
}

#[test]
fn test_repeated_updates_strictly_increase_updated_at() -> AppResult<()> {
    let db = Database::open_in_memory()?;
    let conn = db.get_conn()?;
    let id = entries::create_entry(&conn, &input("James", 1))?;

    let mut last = entries::get_entry(&conn, id)?.expect("entry").updated_at;
    for chapter in 2..=5 {
        entries::update_entry(&conn, id, &input("James", chapter))?;
        let now = entries::get_entry(&conn, id)?.expect("entry").updated_at;
        assert!(now > last);
        last = now;
    }
    Ok(())
}

#[test]
fn test_delete_missing_entry_is_not_found() -> AppResult<()> {
    let db = Database::open_in_memory()?;
    let conn = db.get_conn()?;

    match entries::delete_entry(&conn, 12) {
        Err(AppError::Database(DatabaseError::NotFound(msg))) => assert!(msg.contains("12")),
        other => panic!("Expected NotFound, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_ids_are_not_reused_after_reopen() -> AppResult<()> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("journal.db");

    let deleted = {
        let db = Database::open(&db_path)?;
        let conn = db.get_conn()?;
        entries::create_entry(&conn, &input("Jude", 1))?;
        let last = entries::create_entry(&conn, &input("Jude", 1))?;
        entries::delete_entry(&conn, last)?;
        last
    };

    let db = Database::open(&db_path)?;
    let conn = db.get_conn()?;
    let next = entries::create_entry(&conn, &input("Jude", 1))?;
    assert!(next > deleted);
    Ok(())
}

#[test]
fn test_count_by_book_and_listing() -> AppResult<()> {
    let db = Database::open_in_memory()?;
    let conn = db.get_conn()?;
    for chapter in [3, 1, 2] {
        entries::create_entry(&conn, &input("Philippians", chapter))?;
    }
    entries::create_entry(&conn, &input("Colossians", 1))?;

    assert_eq!(entries::count_entries_by_book(&conn, "Philippians")?, 3);

    let chapters: Vec<u32> = entries::list_entries_by_book(&conn, "Philippians")?
        .iter()
        .map(|e| e.chapter_start)
        .collect();
    assert_eq!(chapters, vec![1, 2, 3]);

    let newest = entries::list_entries(&conn, 1, 0)?;
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].book_name, "Colossians");
    Ok(())
}
