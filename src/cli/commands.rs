//! Handlers behind each subcommand.
//!
//! Handlers print human-readable output to stdout; diagnostics go through
//! `tracing` to stderr.

use super::{Command, EditArgs, EntryArgs};
use crate::books::{self, Testament};
use crate::config::Config;
use crate::constants::{REFLECTION_SLOTS, YEARLY_WINDOW_DAYS};
use crate::dates;
use crate::db::entries::{self, JournalEntry, JournalEntryInput};
use crate::db::Database;
use crate::errors::{AppResult, DatabaseError, ValidationError};
use crate::ops::backup::{self, RestoreMode};
use crate::ops::flashback::{self, RecentFlashbacks};
use crate::ops::stats;
use chrono::Duration;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// Runs one subcommand against the configured store.
///
/// Returns the process exit code on success; `today` exits with failure when no
/// entry has been recorded yet.
pub fn run(command: Command, config: &Config) -> AppResult<ExitCode> {
    debug!("Running {:?}", command);

    match command {
        Command::Add(args) => add(config, args),
        Command::Edit { id, changes } => edit(config, id, changes),
        Command::Show { id } => show(config, id),
        Command::List { limit, offset } => list(config, limit, offset),
        Command::Book { name } => book(config, &name),
        Command::Search { term } => search(config, &term),
        Command::Delete { id } => delete(config, id),
        Command::Stats { json } => show_stats(config, json),
        Command::Calendar { from, to } => calendar(config, from.as_deref(), to.as_deref()),
        Command::Flashback => show_flashback(config),
        Command::Export { output } => export(config, output),
        Command::Import {
            file,
            mode,
            dry_run,
        } => import(config, &file, mode.into(), dry_run),
        Command::Today => today(config),
        Command::Books => list_books(),
    }
}

fn open(config: &Config) -> AppResult<Database> {
    Database::open(&config.db_path)
}

fn reflections(answers: Vec<String>) -> Result<Vec<Option<String>>, ValidationError> {
    if answers.len() > REFLECTION_SLOTS {
        return Err(ValidationError::TooManyReflections {
            max: REFLECTION_SLOTS,
            got: answers.len(),
        });
    }
    Ok(answers.into_iter().map(Some).collect())
}

fn entry_input(args: EntryArgs) -> Result<JournalEntryInput, ValidationError> {
    let book_name = books::resolve_passage(&args.book, args.chapter, args.chapter_end)?;
    Ok(JournalEntryInput {
        book_name: book_name.to_string(),
        chapter_start: args.chapter,
        chapter_end: args.chapter_end,
        verse_start: args.verse_start,
        verse_end: args.verse_end,
        reflections: reflections(args.reflections)?,
        notes: args.notes,
    })
}

/// Applies the given changes on top of an existing entry.
fn apply_changes(
    existing: &JournalEntry,
    changes: EditArgs,
) -> Result<JournalEntryInput, ValidationError> {
    let mut input = JournalEntryInput::from(existing);

    if let Some(book) = changes.book {
        input.book_name = book;
    }
    if let Some(chapter) = changes.chapter {
        input.chapter_start = chapter;
    }
    if changes.chapter_end.is_some() {
        input.chapter_end = changes.chapter_end;
    }
    if changes.verse_start.is_some() {
        input.verse_start = changes.verse_start;
    }
    if changes.verse_end.is_some() {
        input.verse_end = changes.verse_end;
    }
    if !changes.reflections.is_empty() {
        input.reflections = reflections(changes.reflections)?;
    }
    if changes.notes.is_some() {
        input.notes = changes.notes;
    }

    let book_name =
        books::resolve_passage(&input.book_name, input.chapter_start, input.chapter_end)?;
    input.book_name = book_name.to_string();
    Ok(input)
}

fn print_summary_line(entry: &JournalEntry) {
    println!("{}", entry);
}

fn print_entry(entry: &JournalEntry) {
    println!("#{} {}", entry.id, entry.passage());
    println!("Created: {}", entry.created_at.format("%Y-%m-%d %H:%M"));
    if entry.updated_at != entry.created_at {
        println!("Updated: {}", entry.updated_at.format("%Y-%m-%d %H:%M"));
    }
    for (index, reflection) in entry.reflections.iter().enumerate() {
        if let Some(text) = reflection.as_deref().filter(|t| !t.trim().is_empty()) {
            println!("\nReflection {}:\n{}", index + 1, text);
        }
    }
    if let Some(notes) = entry.notes.as_deref().filter(|t| !t.trim().is_empty()) {
        println!("\nNotes:\n{}", notes);
    }
}

fn print_entries(entries: &[JournalEntry], empty_message: &str) {
    if entries.is_empty() {
        println!("{}", empty_message);
        return;
    }
    for entry in entries {
        print_summary_line(entry);
    }
}

fn add(config: &Config, args: EntryArgs) -> AppResult<ExitCode> {
    let input = entry_input(args)?;
    let db = open(config)?;
    let conn = db.get_conn()?;
    let id = entries::create_entry(&conn, &input)?;

    info!("Created entry {}", id);
    println!("Saved entry #{} ({} {})", id, input.book_name, input.chapter_start);
    Ok(ExitCode::SUCCESS)
}

fn edit(config: &Config, id: i64, changes: EditArgs) -> AppResult<ExitCode> {
    let db = open(config)?;
    let conn = db.get_conn()?;
    let existing = entries::get_entry(&conn, id)?
        .ok_or_else(|| DatabaseError::NotFound(format!("Entry with id {} not found", id)))?;

    let input = apply_changes(&existing, changes)?;
    entries::update_entry(&conn, id, &input)?;

    println!("Updated entry #{}", id);
    Ok(ExitCode::SUCCESS)
}

fn show(config: &Config, id: i64) -> AppResult<ExitCode> {
    let db = open(config)?;
    let conn = db.get_conn()?;
    match entries::get_entry(&conn, id)? {
        Some(entry) => {
            print_entry(&entry);
            Ok(ExitCode::SUCCESS)
        }
        None => Err(DatabaseError::NotFound(format!("Entry with id {} not found", id)).into()),
    }
}

fn list(config: &Config, limit: i64, offset: i64) -> AppResult<ExitCode> {
    let db = open(config)?;
    let conn = db.get_conn()?;
    let page = entries::list_entries(&conn, limit, offset)?;
    print_entries(&page, "No entries yet.");
    Ok(ExitCode::SUCCESS)
}

fn book(config: &Config, name: &str) -> AppResult<ExitCode> {
    let book = books::find(name).ok_or_else(|| ValidationError::UnknownBook(name.to_string()))?;
    let db = open(config)?;
    let conn = db.get_conn()?;
    let found = entries::list_entries_by_book(&conn, book.name)?;
    print_entries(&found, &format!("No entries for {} yet.", book.name));
    Ok(ExitCode::SUCCESS)
}

fn search(config: &Config, term: &str) -> AppResult<ExitCode> {
    let db = open(config)?;
    let conn = db.get_conn()?;
    let found = entries::search_entries(&conn, term)?;
    print_entries(&found, "No matching entries.");
    Ok(ExitCode::SUCCESS)
}

fn delete(config: &Config, id: i64) -> AppResult<ExitCode> {
    let db = open(config)?;
    let conn = db.get_conn()?;
    entries::delete_entry(&conn, id)?;
    println!("Deleted entry #{}", id);
    Ok(ExitCode::SUCCESS)
}

fn show_stats(config: &Config, json: bool) -> AppResult<ExitCode> {
    let db = open(config)?;
    let summary = stats::summarize(&db)?;

    if json {
        let text = serde_json::to_string_pretty(&summary).map_err(std::io::Error::from)?;
        println!("{}", text);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Entries:         {}", summary.total_entries);
    println!(
        "Read today:      {}",
        if summary.has_entry_today { "yes" } else { "no" }
    );
    println!("Current streak:  {} days", summary.current_streak);
    println!("Longest streak:  {} days", summary.longest_streak);
    println!("Active days:     {}", summary.active_days);
    println!("Missed days:     {}", summary.missed_days);
    println!("Comebacks:       {}", summary.comeback_days);
    println!("Books read:      {}", summary.books_read);
    if let Some(first) = summary.first_entry {
        println!("Reading since:   {}", first);
    }
    Ok(ExitCode::SUCCESS)
}

fn calendar(config: &Config, from: Option<&str>, to: Option<&str>) -> AppResult<ExitCode> {
    let end = match to {
        Some(raw) => dates::parse_local_date(raw)?,
        None => dates::today(),
    };
    let start = match from {
        Some(raw) => dates::parse_local_date(raw)?,
        None => end - Duration::days(YEARLY_WINDOW_DAYS),
    };

    let db = open(config)?;
    let counts = stats::daily_entry_counts(&db, start, end)?;
    if counts.is_empty() {
        println!("No entries between {} and {}.", start, end);
    }
    for (day, count) in counts {
        println!("{}  {}", day, count);
    }
    Ok(ExitCode::SUCCESS)
}

fn show_flashback(config: &Config) -> AppResult<ExitCode> {
    let history_path = config.flashback_history_path();
    let mut recent = RecentFlashbacks::load(&history_path)?;

    let db = open(config)?;
    match flashback::flashback_entry(&db, &recent.ids())? {
        Some(found) => {
            println!("{}\n", found.kind);
            print_entry(&found.entry);
            recent.record(found.entry.id);
            recent.save(&history_path)?;
        }
        None => println!("No flashback available yet. Keep reading!"),
    }
    Ok(ExitCode::SUCCESS)
}

fn export(config: &Config, output: Option<String>) -> AppResult<ExitCode> {
    let path = match output {
        Some(raw) => PathBuf::from(raw),
        None => config.default_backup_path(dates::today()),
    };

    let db = open(config)?;
    let document = backup::export_all(&db)?;
    backup::write_backup_file(&document, &path)?;

    println!(
        "Exported {} entries to {}",
        document.total_entries,
        path.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn import(config: &Config, file: &str, mode: RestoreMode, dry_run: bool) -> AppResult<ExitCode> {
    if dry_run {
        let json = fs::read_to_string(file)?;
        let validation = backup::validate_backup(&json);
        if !validation.valid {
            println!("Invalid backup: {}", validation.error.unwrap_or_default());
            return Ok(ExitCode::FAILURE);
        }
        println!("Valid backup with {} entries", validation.entry_count);
        if let Some((first, last)) = validation.date_range {
            println!("Covering {} to {}", first, last);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let document = backup::read_backup_file(Path::new(file))?;
    let db = open(config)?;
    let report = backup::restore(&db, &document, mode)?;

    println!("{} entries restored", report.imported);
    if report.skipped_duplicates > 0 {
        println!("{} duplicates skipped", report.skipped_duplicates);
    }
    if report.failed > 0 {
        println!("{} entries could not be restored", report.failed);
    }
    Ok(ExitCode::SUCCESS)
}

fn today(config: &Config) -> AppResult<ExitCode> {
    let db = open(config)?;
    if stats::has_entry_today(&db)? {
        println!("You have read today.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("No entry yet today.");
        Ok(ExitCode::FAILURE)
    }
}

fn list_books() -> AppResult<ExitCode> {
    for (testament, heading) in [
        (Testament::Old, "Old Testament"),
        (Testament::New, "New Testament"),
    ] {
        println!("{}", heading);
        for book in books::BOOKS.iter().filter(|b| b.testament == testament) {
            println!("  {:<18} {}", book.name, book.chapters);
        }
    }
    Ok(ExitCode::SUCCESS)
}
