//! Per-flashcard spaced repetition state.
use super::ReviewStage;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Row id of the flashcard the state belongs to.
pub type CardId = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewableCard {
    pub id: CardId,
    pub stage: ReviewStage,
    /// Kept alongside `stage` so stored rows show the interval that was applied.
    pub current_interval_minutes: i64,
    pub success_count: u32,
    pub failure_count: u32,
    pub confidence_level: f64,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by the store on every save.
    #[serde(default)]
    pub version: i64,
}

impl ReviewableCard {
    pub fn new(id: CardId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            stage: ReviewStage::Initial,
            current_interval_minutes: ReviewStage::Initial.interval_minutes(),
            success_count: 0,
            failure_count: 0,
            confidence_level: 0.0,
            last_reviewed_at: created_at,
            next_review_at: created_at,
            version: 0,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    pub fn review_count(&self) -> u32 {
        self.success_count + self.failure_count
    }

    pub fn has_been_reviewed(&self) -> bool {
        self.review_count() > 0
    }

    /// Share of correct answers, `None` before the first review.
    pub fn success_rate(&self) -> Option<f64> {
        match self.review_count() {
            0 => None,
            total => Some(f64::from(self.success_count) / f64::from(total)),
        }
    }

    pub fn scheduled_interval(&self) -> Duration {
        self.next_review_at - self.last_reviewed_at
    }
}
