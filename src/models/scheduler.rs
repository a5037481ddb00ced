//! Fixed-stage spaced repetition scheduler.
//!
//! Each answer moves a card along the [`ReviewStage`] ladder:
//! - Correct: one rung up (clamped at `ThreeMonths`), confidence smoothed toward 1.0
//! - Wrong: back to `Initial` or one rung down depending on [`FailurePolicy`],
//!   confidence decayed toward 0.0
//! - The next review is due `interval_minutes` of the new stage after the answer

use super::{CardId, ReviewRecord, ReviewStage, ReviewableCard};
use crate::clock::Clock;
use crate::config::{FailurePolicy, SchedulerConfig};
use crate::database::store::CardStore;
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};

/// Computes the state of `card` after one answer given at `now`.
///
/// Panics if the card's confidence lies outside [0, 1] or its timestamps are
/// out of order; such a card can only come from a bug elsewhere.
pub fn record_outcome(
    card: &ReviewableCard,
    is_correct: bool,
    now: DateTime<Utc>,
    config: &SchedulerConfig,
) -> ReviewableCard {
    assert!(
        (0.0..=1.0).contains(&card.confidence_level),
        "confidence level {} of card {} is outside [0, 1]",
        card.confidence_level,
        card.id
    );
    assert!(
        card.next_review_at >= card.last_reviewed_at,
        "card {} is scheduled before its last review",
        card.id
    );

    let alpha = config.smoothing_factor;
    let mut next = card.clone();

    if is_correct {
        next.success_count += 1;
        next.stage = card.stage.next();
        next.confidence_level = card.confidence_level + alpha * (1.0 - card.confidence_level);
    } else {
        next.failure_count += 1;
        next.stage = match config.failure_policy {
            FailurePolicy::Reset => ReviewStage::Initial,
            FailurePolicy::StepBack => card.stage.previous(),
        };
        next.confidence_level = card.confidence_level * (1.0 - alpha);
    }

    // Guard against float drift at the edges
    next.confidence_level = next.confidence_level.clamp(0.0, 1.0);
    next.current_interval_minutes = next.stage.interval_minutes();
    next.last_reviewed_at = now;
    next.next_review_at = now + Duration::minutes(next.current_interval_minutes);

    next
}

/// Scheduler bound to a configuration and a time source.
pub struct ReviewScheduler<C: Clock> {
    config: SchedulerConfig,
    clock: C,
}

impl<C: Clock> ReviewScheduler<C> {
    pub fn new(config: SchedulerConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn record_outcome(&self, card: &ReviewableCard, is_correct: bool) -> ReviewableCard {
        record_outcome(card, is_correct, self.clock.now(), &self.config)
    }

    /// Loads a card, applies the answer and saves it back together with a
    /// review log entry.
    ///
    /// `NotFound` and `Conflict` from the store are returned as-is; retrying
    /// with fresh state is up to the caller.
    pub fn review<S: CardStore + ?Sized>(
        &self,
        store: &S,
        card_id: CardId,
        is_correct: bool,
    ) -> Result<ReviewableCard> {
        let card = store.load(card_id)?;
        let mut updated = self.record_outcome(&card, is_correct);
        let record = ReviewRecord::new(card_id, updated.last_reviewed_at, is_correct);
        store.save_review(&mut updated, &record)?;

        tracing::debug!(
            card_id,
            is_correct,
            stage = ?updated.stage,
            next_review_at = %updated.next_review_at,
            "Recorded review outcome"
        );

        Ok(updated)
    }
}
