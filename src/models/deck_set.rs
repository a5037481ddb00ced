//! Container for all available decks
use super::Deck;

#[derive(Clone, Debug, Default)]
pub struct DeckSet {
    pub decks: Vec<Deck>,
}

impl DeckSet {
    pub fn contains(&self, name: &str) -> bool {
        self.decks.iter().any(|d| d.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Deck> {
        let index = self.decks.iter().position(|d| d.name == name)?;
        Some(self.decks.remove(index))
    }
}
