//! Database operations for the study assistant
//!
//! Handles SQLite schema setup, CRUD operations for decks and flashcards,
//! due-card queries and the simulated clock offset.

use super::store::{
    REVIEW_STATE_COLUMNS, insert_review_state, review_record_from_row, review_state_from_row, to_millis,
};
use crate::clock::OffsetClock;
use crate::error::{Result, StoreError};
use crate::models::{CardId, Deck, DeckSet, Flashcard, ReviewRecord, ReviewableCard};
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, params};
use std::path::Path;

/// Opens (or creates) the database file and makes sure the schema exists.
pub fn init_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    tracing::info!(path = %path.display(), "Database ready");
    Ok(conn)
}

/// Creates tables for decks, flashcards, review state, the review log and app state.
///
/// Review state and log rows go away together with their flashcard, and
/// flashcards together with their deck.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            name TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_name TEXT NOT NULL,
            term TEXT NOT NULL,
            definition TEXT NOT NULL,
            FOREIGN KEY (deck_name) REFERENCES decks(name) ON DELETE CASCADE,
            UNIQUE(deck_name, term)
        );

        CREATE TABLE IF NOT EXISTS review_state (
            flashcard_id INTEGER PRIMARY KEY,
            stage INTEGER NOT NULL DEFAULT 0,
            current_interval_minutes INTEGER NOT NULL DEFAULT 0,
            success_count INTEGER NOT NULL DEFAULT 0,
            failure_count INTEGER NOT NULL DEFAULT 0,
            confidence_level REAL NOT NULL DEFAULT 0.0,
            last_reviewed_at INTEGER NOT NULL,
            next_review_at INTEGER NOT NULL,
            version INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS review_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            flashcard_id INTEGER NOT NULL,
            reviewed_at INTEGER NOT NULL,
            is_correct INTEGER NOT NULL,
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_review_log_flashcard ON review_log(flashcard_id);

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        INSERT OR IGNORE INTO app_state (key, value) VALUES ('clock_offset_days', '0');",
    )?;
    Ok(())
}

/// Number of simulated days the clock runs ahead of wall-clock time.
pub fn get_clock_offset_days(conn: &Connection) -> Result<i64> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'clock_offset_days'",
        [],
        |row| row.get(0),
    )?;

    value.parse::<i64>().map_err(|e| {
        tracing::error!(value = %value, "Unreadable clock offset");
        StoreError::Database(rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
    })
}

/// Clock that honours the simulated day offset.
pub fn current_clock(conn: &Connection) -> Result<OffsetClock> {
    let days = get_clock_offset_days(conn)?;
    Ok(OffsetClock::new(Duration::days(days)))
}

/// Moves the simulated clock forward by 24 hours
pub fn advance_day(conn: &Connection) -> Result<()> {
    let days = get_clock_offset_days(conn)? + 1;
    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'clock_offset_days'",
        params![days.to_string()],
    )?;
    tracing::info!(offset_days = days, "Advanced simulated clock");
    Ok(())
}

fn deck_exists(name: &str, conn: &Connection) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM decks WHERE name = ?1)",
        params![name],
        |row| row.get(0),
    )?)
}

/// Creates a new deck in the database
pub fn new_deck(name: &str, conn: &Connection) -> Result<()> {
    if deck_exists(name, conn)? {
        return Err(StoreError::DuplicateDeck(name.to_string()));
    }
    conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
    tracing::info!(deck = name, "Deck created");
    Ok(())
}

/// Deletes a deck together with its flashcards and their review state
pub fn delete_deck(name: &str, conn: &Connection) -> Result<()> {
    let deleted = conn.execute("DELETE FROM decks WHERE name = ?1", params![name])?;
    if deleted == 0 {
        return Err(StoreError::DeckNotFound(name.to_string()));
    }
    tracing::info!(deck = name, "Deck deleted");
    Ok(())
}

/// Adds a flashcard to a deck and initializes its review state at `created_at`
///
/// Returns the flashcard ID. A term already present in the deck is rejected
/// with `DuplicateFlashcard` and the stored card is left untouched.
pub fn add_flashcard(
    deck_name: &str,
    term: &str,
    definition: &str,
    created_at: DateTime<Utc>,
    conn: &Connection,
) -> Result<CardId> {
    if !deck_exists(deck_name, conn)? {
        return Err(StoreError::DeckNotFound(deck_name.to_string()));
    }

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM flashcards WHERE deck_name = ?1 AND term = ?2)",
        params![deck_name, term],
        |row| row.get(0),
    )?;
    if exists {
        return Err(StoreError::DuplicateFlashcard {
            deck: deck_name.to_string(),
            term: term.to_string(),
        });
    }

    conn.execute(
        "INSERT INTO flashcards (deck_name, term, definition) VALUES (?1, ?2, ?3)",
        params![deck_name, term, definition],
    )?;
    let flashcard_id: CardId = conn.last_insert_rowid();

    insert_review_state(&ReviewableCard::new(flashcard_id, created_at), conn)?;

    Ok(flashcard_id)
}

/// Retrieves all flashcards for a given deck
///
/// Returns vector of (flashcard_id, Flashcard) tuples
pub fn get_flashcards_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<(CardId, Flashcard)>> {
    let mut stmt =
        conn.prepare("SELECT id, term, definition FROM flashcards WHERE deck_name = ?1 ORDER BY id")?;

    let flashcards = stmt
        .query_map(params![deck_name], |row| {
            Ok((
                row.get(0)?,
                Flashcard {
                    term: row.get(1)?,
                    definition: row.get(2)?,
                },
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(flashcards)
}

/// Retrieves flashcards due for review in a deck
///
/// Returns flashcards where next_review_at <= now,
/// ordered by next_review_at (oldest first).
pub fn get_flashcards_due_for_review(
    deck_name: &str,
    now: DateTime<Utc>,
    conn: &Connection,
) -> Result<Vec<(CardId, Flashcard, ReviewableCard)>> {
    let sql = format!(
        "SELECT f.term, f.definition, {REVIEW_STATE_COLUMNS}
         FROM flashcards f
         JOIN review_state r ON f.id = r.flashcard_id
         WHERE f.deck_name = ?1 AND r.next_review_at <= ?2
         ORDER BY r.next_review_at ASC, f.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let flashcards = stmt
        .query_map(params![deck_name, to_millis(now)], |row| {
            let state = review_state_from_row(row, 2)?;
            Ok((
                state.id,
                Flashcard {
                    term: row.get(0)?,
                    definition: row.get(1)?,
                },
                state,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(flashcards)
}

/// Retrieves the review state of every flashcard in a deck
pub fn get_review_states_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<ReviewableCard>> {
    if !deck_exists(deck_name, conn)? {
        return Err(StoreError::DeckNotFound(deck_name.to_string()));
    }

    let sql = format!(
        "SELECT {REVIEW_STATE_COLUMNS}
         FROM flashcards f
         JOIN review_state r ON f.id = r.flashcard_id
         WHERE f.deck_name = ?1
         ORDER BY f.id"
    );
    let mut stmt = conn.prepare(&sql)?;

    let states = stmt
        .query_map(params![deck_name], |row| review_state_from_row(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(states)
}

/// Retrieves every logged review of the deck's flashcards, oldest first
pub fn get_review_log_for_deck(deck_name: &str, conn: &Connection) -> Result<Vec<ReviewRecord>> {
    if !deck_exists(deck_name, conn)? {
        return Err(StoreError::DeckNotFound(deck_name.to_string()));
    }

    let mut stmt = conn.prepare(
        "SELECT l.flashcard_id, l.reviewed_at, l.is_correct
         FROM review_log l
         JOIN flashcards f ON f.id = l.flashcard_id
         WHERE f.deck_name = ?1
         ORDER BY l.reviewed_at ASC, l.id ASC",
    )?;

    let records = stmt
        .query_map(params![deck_name], review_record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(records)
}

/// Retrieves all deck names from database
pub fn get_all_decks(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM decks ORDER BY name")?;
    let decks = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(decks)
}

/// Loads all decks with their flashcards into memory
///
/// Does not load review state - that's fetched separately when starting a learning session.
pub fn load_all_decks(conn: &Connection) -> Result<DeckSet> {
    let mut decks = Vec::new();

    for deck_name in get_all_decks(conn)? {
        let flashcards = get_flashcards_for_deck(&deck_name, conn)?
            .into_iter()
            .map(|(_, fc)| fc)
            .collect();

        decks.push(Deck {
            name: deck_name,
            flashcards,
        });
    }

    Ok(DeckSet { decks })
}

/// Stores an imported deck with fresh review state for every card
///
/// Repeated terms in the file keep their first definition.
pub fn import_deck(deck: &Deck, created_at: DateTime<Utc>, conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    new_deck(&deck.name, &tx)?;
    let mut imported = 0;
    for flashcard in &deck.flashcards {
        match add_flashcard(&deck.name, &flashcard.term, &flashcard.definition, created_at, &tx) {
            Ok(_) => imported += 1,
            Err(StoreError::DuplicateFlashcard { term, .. }) => {
                tracing::warn!(deck = %deck.name, term = %term, "Skipping repeated term");
            }
            Err(e) => return Err(e),
        }
    }
    tx.commit()?;

    tracing::info!(deck = %deck.name, cards = imported, "Deck imported");
    Ok(())
}
