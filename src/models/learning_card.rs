//! Wrapper for flashcards that tracks progress within one learning session.
use super::Flashcard;

#[derive(Clone, Debug)]
pub struct LearningCard {
    pub flashcard: Flashcard,
    pub is_learned: bool,
}

impl LearningCard {
    pub fn new(flashcard: Flashcard) -> Self {
        Self {
            flashcard,
            is_learned: false,
        }
    }

    pub fn mark_as_learned(&mut self) {
        self.is_learned = true;
    }
}
