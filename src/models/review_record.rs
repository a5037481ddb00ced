//! One answered review, as kept in the review log.
use super::CardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub card_id: CardId,
    pub reviewed_at: DateTime<Utc>,
    pub is_correct: bool,
}

impl ReviewRecord {
    pub fn new(card_id: CardId, reviewed_at: DateTime<Utc>, is_correct: bool) -> Self {
        Self {
            card_id,
            reviewed_at,
            is_correct,
        }
    }
}
