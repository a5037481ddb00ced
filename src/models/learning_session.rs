//! Learning session management for spaced repetition practice.
//! Handles multi-round flashcard review on top of the stage scheduler.

use super::{CardId, Flashcard, LearningCard, ReviewScheduler, ReviewableCard};
use crate::config::SchedulerConfig;
use crate::database::{SqliteCardStore, db};
use crate::error::Result;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, PoisonError};

/// Manages a learning session with multiple review rounds.
/// Cards answered incorrectly are repeated in subsequent rounds.
pub struct LearningSession {
    pub deck_name: String,
    pub all_cards: Vec<(CardId, LearningCard, ReviewableCard)>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_definition: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub scheduler_config: SchedulerConfig,
    pub round_number: usize,
}

impl LearningSession {
    /// Creates a new learning session from cards that are due for review.
    pub fn new_from_due_cards(
        deck_name: String,
        cards: Vec<(CardId, Flashcard, ReviewableCard)>,
        conn: Arc<Mutex<Connection>>,
        scheduler_config: SchedulerConfig,
    ) -> Self {
        let learning_cards: Vec<_> = cards
            .into_iter()
            .map(|(id, fc, state)| (id, LearningCard::new(fc), state))
            .collect();

        let indices: Vec<usize> = (0..learning_cards.len()).collect();

        Self {
            deck_name,
            all_cards: learning_cards,
            current_round_cards: indices,
            current_index: 0,
            show_definition: false,
            conn,
            scheduler_config,
            round_number: 1,
        }
    }

    fn current_entry(&self) -> Option<&(CardId, LearningCard, ReviewableCard)> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx))
    }

    pub fn current_card(&self) -> Option<&LearningCard> {
        self.current_entry().map(|(_, card, _)| card)
    }

    pub fn current_state(&self) -> Option<&ReviewableCard> {
        self.current_entry().map(|(_, _, state)| state)
    }

    pub fn toggle_definition(&mut self) {
        self.show_definition = !self.show_definition;
    }

    pub fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.show_definition = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards answered incorrectly.
    /// If no cards remain, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(_, card, _)| !card.is_learned)
                    .unwrap_or(false)
            })
            .collect();

        if !failed_indices.is_empty() {
            self.current_round_cards = failed_indices;
            self.current_index = 0;
            self.show_definition = false;
            self.round_number += 1;
        }
    }

    /// Records the answer for the current card through the scheduler and
    /// stores the new review state.
    pub fn grade_current_card(&mut self, is_correct: bool) -> Result<()> {
        let Some(&actual_idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(());
        };
        let Some((card_id, card, review_state)) = self.all_cards.get_mut(actual_idx) else {
            return Ok(());
        };

        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let clock = db::current_clock(&conn)?;
        let scheduler = ReviewScheduler::new(self.scheduler_config.clone(), clock);
        let store = SqliteCardStore::new(&conn);

        let updated = scheduler.review(&store, *card_id, is_correct)?;

        if is_correct {
            card.mark_as_learned();
        } else {
            card.is_learned = false;
        }
        *review_state = updated;

        Ok(())
    }

    pub fn learned_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(_, card, _)| card.is_learned)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.learned_count()
    }

    /// Returns true when every card in the current round was answered correctly.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.learned_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
