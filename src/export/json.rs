//! JSON import/export for flashcard decks.
//! Only terms and definitions travel; review progress stays in the database.

use crate::error::ExportError;
use crate::models::Deck;
use std::fs;
use std::path::Path;

/// Writes a deck as pretty-printed JSON to `path`.
pub fn export_json_to_path(deck: &Deck, path: &Path) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(deck)?;
    fs::write(path, json_string)?;
    tracing::info!(deck = %deck.name, path = %path.display(), "Deck exported");
    Ok(())
}

/// Reads a deck from a JSON file.
///
/// Cards with a blank term or definition are dropped.
pub fn import_json(path: &Path) -> Result<Deck, ExportError> {
    let contents = fs::read_to_string(path)?;
    let mut deck: Deck = serde_json::from_str(&contents)?;

    let before = deck.flashcards.len();
    deck.flashcards.retain(|card| card.is_valid());
    if deck.flashcards.len() != before {
        tracing::warn!(
            deck = %deck.name,
            skipped = before - deck.flashcards.len(),
            "Skipped blank flashcards"
        );
    }

    tracing::info!(deck = %deck.name, path = %path.display(), "Deck read from file");
    Ok(deck)
}
