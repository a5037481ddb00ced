//! Flashcard is a pair <term, definition>. Only text is used in terms and definitions
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

impl Flashcard {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }

    /// Both sides must contain something other than whitespace.
    pub fn is_valid(&self) -> bool {
        !self.term.trim().is_empty() && !self.definition.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flashcard_creation() {
        let card = Flashcard::new("hello", "cześć");

        assert_eq!(card.term, "hello");
        assert_eq!(card.definition, "cześć");
        assert!(card.is_valid());
    }

    #[test]
    fn test_blank_side_is_invalid() {
        assert!(!Flashcard::new("  ", "cześć").is_valid());
        assert!(!Flashcard::new("hello", "").is_valid());
    }
}
