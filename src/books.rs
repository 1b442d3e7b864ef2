//! The 66 canonical books and their chapter counts.
//!
//! Storage keeps book names as plain text with no foreign key; callers resolve
//! user input against this list before creating entries.

use crate::errors::ValidationError;

/// Which half of the canon a book belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Testament {
    Old,
    New,
}

/// A canonical book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Book {
    pub name: &'static str,
    pub chapters: u32,
    pub testament: Testament,
}

const fn ot(name: &'static str, chapters: u32) -> Book {
    Book {
        name,
        chapters,
        testament: Testament::Old,
    }
}

const fn nt(name: &'static str, chapters: u32) -> Book {
    Book {
        name,
        chapters,
        testament: Testament::New,
    }
}

/// All books in canonical order.
pub const BOOKS: [Book; 66] = [
    ot("Genesis", 50),
    ot("Exodus", 40),
    ot("Leviticus", 27),
    ot("Numbers", 36),
    ot("Deuteronomy", 34),
    ot("Joshua", 24),
    ot("Judges", 21),
    ot("Ruth", 4),
    ot("1 Samuel", 31),
    ot("2 Samuel", 24),
    ot("1 Kings", 22),
    ot("2 Kings", 25),
    ot("1 Chronicles", 29),
    ot("2 Chronicles", 36),
    ot("Ezra", 10),
    ot("Nehemiah", 13),
    ot("Esther", 10),
    ot("Job", 42),
    ot("Psalms", 150),
    ot("Proverbs", 31),
    ot("Ecclesiastes", 12),
    ot("Song of Solomon", 8),
    ot("Isaiah", 66),
    ot("Jeremiah", 52),
    ot("Lamentations", 5),
    ot("Ezekiel", 48),
    ot("Daniel", 12),
    ot("Hosea", 14),
    ot("Joel", 3),
    ot("Amos", 9),
    ot("Obadiah", 1),
    ot("Jonah", 4),
    ot("Micah", 7),
    ot("Nahum", 3),
    ot("Habakkuk", 3),
    ot("Zephaniah", 3),
    ot("Haggai", 2),
    ot("Zechariah", 14),
    ot("Malachi", 4),
    nt("Matthew", 28),
    nt("Mark", 16),
    nt("Luke", 24),
    nt("John", 21),
    nt("Acts", 28),
    nt("Romans", 16),
    nt("1 Corinthians", 16),
    nt("2 Corinthians", 13),
    nt("Galatians", 6),
    nt("Ephesians", 6),
    nt("Philippians", 4),
    nt("Colossians", 4),
    nt("1 Thessalonians", 5),
    nt("2 Thessalonians", 3),
    nt("1 Timothy", 6),
    nt("2 Timothy", 4),
    nt("Titus", 3),
    nt("Philemon", 1),
    nt("Hebrews", 13),
    nt("James", 5),
    nt("1 Peter", 5),
    nt("2 Peter", 3),
    nt("1 John", 5),
    nt("2 John", 1),
    nt("3 John", 1),
    nt("Jude", 1),
    nt("Revelation", 22),
];

/// Looks up a book by name, ignoring case and surrounding whitespace.
pub fn find(name: &str) -> Option<&'static Book> {
    let wanted = name.trim();
    BOOKS.iter().find(|book| book.name.eq_ignore_ascii_case(wanted))
}

/// Resolves a book name and checks the chapter range against it.
///
/// Returns the canonical spelling of the book.
pub fn resolve_passage(
    name: &str,
    chapter_start: u32,
    chapter_end: Option<u32>,
) -> Result<&'static str, ValidationError> {
    let book = find(name).ok_or_else(|| ValidationError::UnknownBook(name.to_string()))?;

    for chapter in std::iter::once(chapter_start).chain(chapter_end) {
        if chapter > book.chapters {
            return Err(ValidationError::ChapterOutOfRange {
                book: book.name.to_string(),
                chapters: book.chapters,
                chapter,
            });
        }
    }

    Ok(book.name)
}
