//! Error types shared across the crate.

use thiserror::Error;

use crate::models::CardId;

/// Errors raised by the persistence layer.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Card not found: {0}")]
    NotFound(CardId),

    /// The stored row changed since it was loaded.
    #[error("Card {card_id} was modified concurrently (expected version {expected_version})")]
    Conflict {
        card_id: CardId,
        expected_version: i64,
    },

    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Deck already exists: {0}")]
    DuplicateDeck(String),

    #[error("Deck {deck} already has a flashcard for \"{term}\"")]
    DuplicateFlashcard { deck: String, term: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised by deck import/export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
