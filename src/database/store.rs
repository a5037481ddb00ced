//! Load/save access to per-card review state.
//!
//! Saves are guarded by a version column: a save only applies when the row
//! still carries the version the card was loaded with, so two concurrent
//! answers to the same card cannot silently overwrite each other.
//! Answered reviews are appended to `review_log` in the same transaction.

use crate::error::{Result, StoreError};
use crate::models::{CardId, ReviewRecord, ReviewableCard};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub trait CardStore {
    fn load(&self, card_id: CardId) -> Result<ReviewableCard>;

    /// Persists `card` and bumps its version on success.
    fn save(&self, card: &mut ReviewableCard) -> Result<()>;

    /// Persists `card` and appends `record` to the review log atomically.
    fn save_review(&self, card: &mut ReviewableCard, record: &ReviewRecord) -> Result<()>;
}

/// Column list matching [`review_state_from_row`].
pub(crate) const REVIEW_STATE_COLUMNS: &str = "r.flashcard_id, r.stage, r.current_interval_minutes, \
     r.success_count, r.failure_count, r.confidence_level, r.last_reviewed_at, r.next_review_at, r.version";

pub(crate) fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

/// Reads a review state whose columns start at `start` in the order of
/// [`REVIEW_STATE_COLUMNS`].
pub(crate) fn review_state_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<ReviewableCard> {
    Ok(ReviewableCard {
        id: row.get(start)?,
        stage: row.get(start + 1)?,
        current_interval_minutes: row.get(start + 2)?,
        success_count: row.get(start + 3)?,
        failure_count: row.get(start + 4)?,
        confidence_level: row.get(start + 5)?,
        last_reviewed_at: millis_column(row, start + 6)?,
        next_review_at: millis_column(row, start + 7)?,
        version: row.get(start + 8)?,
    })
}

/// Inserts the initial review state for a new flashcard. Existing rows are kept.
pub(crate) fn insert_review_state(card: &ReviewableCard, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO review_state (flashcard_id, stage, current_interval_minutes,
             success_count, failure_count, confidence_level, last_reviewed_at, next_review_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            card.id,
            card.stage,
            card.current_interval_minutes,
            card.success_count,
            card.failure_count,
            card.confidence_level,
            to_millis(card.last_reviewed_at),
            to_millis(card.next_review_at),
            card.version
        ],
    )?;
    Ok(())
}

pub struct SqliteCardStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCardStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CardStore for SqliteCardStore<'_> {
    fn load(&self, card_id: CardId) -> Result<ReviewableCard> {
        let sql = format!(
            "SELECT {REVIEW_STATE_COLUMNS} FROM review_state r WHERE r.flashcard_id = ?1"
        );
        self.conn
            .query_row(&sql, params![card_id], |row| review_state_from_row(row, 0))
            .optional()?
            .ok_or(StoreError::NotFound(card_id))
    }

    fn save(&self, card: &mut ReviewableCard) -> Result<()> {
        update_review_state(card, self.conn)?;
        card.version += 1;
        Ok(())
    }

    fn save_review(&self, card: &mut ReviewableCard, record: &ReviewRecord) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        update_review_state(card, &tx)?;
        insert_review_record(record, &tx)?;
        tx.commit()?;
        card.version += 1;
        Ok(())
    }
}

/// Writes `card` over the stored row if the row still has `card.version`.
fn update_review_state(card: &ReviewableCard, conn: &Connection) -> Result<()> {
    let updated = conn.execute(
        "UPDATE review_state
         SET stage = ?1, current_interval_minutes = ?2, success_count = ?3, failure_count = ?4,
             confidence_level = ?5, last_reviewed_at = ?6, next_review_at = ?7,
             version = version + 1
         WHERE flashcard_id = ?8 AND version = ?9",
        params![
            card.stage,
            card.current_interval_minutes,
            card.success_count,
            card.failure_count,
            card.confidence_level,
            to_millis(card.last_reviewed_at),
            to_millis(card.next_review_at),
            card.id,
            card.version
        ],
    )?;

    if updated == 1 {
        return Ok(());
    }

    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM review_state WHERE flashcard_id = ?1)",
        params![card.id],
        |row| row.get(0),
    )?;

    if !exists {
        return Err(StoreError::NotFound(card.id));
    }

    tracing::warn!(
        card_id = card.id,
        expected_version = card.version,
        "Review state changed since it was loaded"
    );
    Err(StoreError::Conflict {
        card_id: card.id,
        expected_version: card.version,
    })
}

fn insert_review_record(record: &ReviewRecord, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO review_log (flashcard_id, reviewed_at, is_correct) VALUES (?1, ?2, ?3)",
        params![record.card_id, to_millis(record.reviewed_at), record.is_correct],
    )?;
    Ok(())
}

pub(crate) fn review_record_from_row(row: &Row<'_>) -> rusqlite::Result<ReviewRecord> {
    Ok(ReviewRecord {
        card_id: row.get(0)?,
        reviewed_at: millis_column(row, 1)?,
        is_correct: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::db;
    use crate::models::ReviewStage;
    use chrono::Duration;

    fn setup() -> (Connection, CardId) {
        let conn = Connection::open_in_memory().unwrap();
        db::create_schema(&conn).unwrap();
        db::new_deck("Test Deck", &conn).unwrap();
        let id = db::add_flashcard("Test Deck", "hello", "cześć", Utc::now(), &conn).unwrap();
        (conn, id)
    }

    #[test]
    fn test_new_flashcard_has_initial_state() {
        let (conn, id) = setup();
        let store = SqliteCardStore::new(&conn);

        let card = store.load(id).unwrap();
        assert_eq!(card.id, id);
        assert_eq!(card.stage, ReviewStage::Initial);
        assert_eq!(card.success_count, 0);
        assert_eq!(card.version, 0);
        assert_eq!(card.last_reviewed_at, card.next_review_at);
    }

    #[test]
    fn test_save_and_load() {
        let (conn, id) = setup();
        let store = SqliteCardStore::new(&conn);

        let mut card = store.load(id).unwrap();
        let now = Utc::now();
        card.stage = ReviewStage::OneHour;
        card.current_interval_minutes = 60;
        card.success_count = 2;
        card.confidence_level = 0.51;
        card.last_reviewed_at = now;
        card.next_review_at = now + Duration::minutes(60);

        store.save(&mut card).unwrap();
        assert_eq!(card.version, 1);

        let loaded = store.load(id).unwrap();
        assert_eq!(loaded.stage, ReviewStage::OneHour);
        assert_eq!(loaded.success_count, 2);
        assert_eq!(loaded.confidence_level, 0.51);
        assert_eq!(loaded.version, 1);
        assert_eq!(
            loaded.next_review_at - loaded.last_reviewed_at,
            Duration::minutes(60)
        );
    }

    #[test]
    fn test_stale_save_conflicts() {
        let (conn, id) = setup();
        let store = SqliteCardStore::new(&conn);

        let mut first = store.load(id).unwrap();
        let mut second = store.load(id).unwrap();

        first.success_count = 1;
        store.save(&mut first).unwrap();

        second.failure_count = 1;
        let result = store.save(&mut second);
        assert!(matches!(
            result,
            Err(StoreError::Conflict {
                expected_version: 0,
                ..
            })
        ));

        // The first write survives
        let loaded = store.load(id).unwrap();
        assert_eq!(loaded.success_count, 1);
        assert_eq!(loaded.failure_count, 0);
    }

    #[test]
    fn test_missing_card() {
        let (conn, _) = setup();
        let store = SqliteCardStore::new(&conn);

        assert!(matches!(store.load(42), Err(StoreError::NotFound(42))));

        let mut ghost = ReviewableCard::new(42, Utc::now());
        assert!(matches!(store.save(&mut ghost), Err(StoreError::NotFound(42))));
    }

    fn log_len(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM review_log", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_save_review_appends_to_log() {
        let (conn, id) = setup();
        let store = SqliteCardStore::new(&conn);

        let mut card = store.load(id).unwrap();
        let now = Utc::now();
        card.success_count = 1;
        card.last_reviewed_at = now;
        card.next_review_at = now;
        store
            .save_review(&mut card, &ReviewRecord::new(id, now, true))
            .unwrap();

        assert_eq!(card.version, 1);
        assert_eq!(log_len(&conn), 1);
        let (logged_at, is_correct): (i64, bool) = conn
            .query_row(
                "SELECT reviewed_at, is_correct FROM review_log WHERE flashcard_id = ?1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(logged_at, to_millis(now));
        assert!(is_correct);
    }

    #[test]
    fn test_conflicting_review_is_not_logged() {
        let (conn, id) = setup();
        let store = SqliteCardStore::new(&conn);
        let now = Utc::now();

        let mut first = store.load(id).unwrap();
        let mut second = store.load(id).unwrap();
        store
            .save_review(&mut first, &ReviewRecord::new(id, now, true))
            .unwrap();

        let result = store.save_review(&mut second, &ReviewRecord::new(id, now, false));
        assert!(matches!(result, Err(StoreError::Conflict { .. })));
        assert_eq!(second.version, 0);
        assert_eq!(log_len(&conn), 1);
    }

    #[test]
    fn test_corrupt_stage_is_rejected() {
        let (conn, id) = setup();
        conn.execute(
            "UPDATE review_state SET stage = 12 WHERE flashcard_id = ?1",
            params![id],
        )
        .unwrap();

        let store = SqliteCardStore::new(&conn);
        assert!(matches!(store.load(id), Err(StoreError::Database(_))));
    }
}
