//! Deck is a set of flashcards
use super::Flashcard;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    #[serde(default)]
    pub flashcards: Vec<Flashcard>,
}

impl Deck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flashcards: Vec::new(),
        }
    }
}
