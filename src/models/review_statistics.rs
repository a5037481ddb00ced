//! Aggregate review statistics over a set of cards and their review log.
//!
//! Everything here is derived at query time; nothing is stored.

use super::{ReviewRecord, ReviewableCard};
use crate::config::StatisticsConfig;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReviewStatistics {
    pub total_flashcards: usize,
    pub due_count: usize,
    pub completed_reviews: u64,
    /// Percentage of correct answers over all reviews, 0 when nothing was reviewed.
    pub average_score: f64,
    pub streak_days: u32,
    pub mastered_count: usize,
    pub struggling_count: usize,
    /// Logged reviews per calendar day in the configured offset.
    pub reviews_per_day: BTreeMap<NaiveDate, usize>,
}

/// Builds statistics from the current card states and the review log.
///
/// Counts and rates come from `cards`; per-day counts and the streak come
/// from `history`, so a card answered on several days shows up on each.
pub fn compute_statistics(
    cards: &[ReviewableCard],
    history: &[ReviewRecord],
    now: DateTime<Utc>,
    config: &StatisticsConfig,
) -> ReviewStatistics {
    let offset = reference_offset(config.utc_offset_minutes);

    let mut stats = ReviewStatistics {
        total_flashcards: cards.len(),
        ..ReviewStatistics::default()
    };
    let mut total_successes: u64 = 0;

    for card in cards {
        if card.is_due(now) {
            stats.due_count += 1;
        }

        stats.completed_reviews += u64::from(card.review_count());
        total_successes += u64::from(card.success_count);

        if card.review_count() >= config.min_reviews {
            if let Some(rate) = card.success_rate() {
                if rate >= config.mastered_threshold {
                    stats.mastered_count += 1;
                } else if rate <= config.struggling_threshold {
                    stats.struggling_count += 1;
                }
            }
        }
    }

    if stats.completed_reviews > 0 {
        stats.average_score = total_successes as f64 / stats.completed_reviews as f64 * 100.0;
    }

    for record in history {
        let day = record.reviewed_at.with_timezone(&offset).date_naive();
        *stats.reviews_per_day.entry(day).or_insert(0) += 1;
    }

    let today = now.with_timezone(&offset).date_naive();
    stats.streak_days = streak_ending_at(today, &stats.reviews_per_day);

    stats
}

/// Offset used for day boundaries. Out-of-range values fall back to UTC.
fn reference_offset(utc_offset_minutes: i32) -> FixedOffset {
    utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

/// Counts consecutive days with reviews, walking back from `today`.
fn streak_ending_at(today: NaiveDate, reviews_per_day: &BTreeMap<NaiveDate, usize>) -> u32 {
    let mut streak = 0;
    let mut day = Some(today);
    while let Some(current) = day {
        if !reviews_per_day.contains_key(&current) {
            break;
        }
        streak += 1;
        day = current.pred_opt();
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::models::{ReviewStage, record_outcome};
    use chrono::{Duration, TimeZone};

    fn reviewed_card(
        id: i64,
        successes: u32,
        failures: u32,
        last_reviewed_at: DateTime<Utc>,
        next_review_at: DateTime<Utc>,
    ) -> ReviewableCard {
        let mut card = ReviewableCard::new(id, last_reviewed_at);
        card.stage = ReviewStage::OneHour;
        card.success_count = successes;
        card.failure_count = failures;
        card.last_reviewed_at = last_reviewed_at;
        card.next_review_at = next_review_at;
        card
    }

    /// One correct log entry per card at its latest review.
    fn latest_reviews(cards: &[ReviewableCard]) -> Vec<ReviewRecord> {
        cards
            .iter()
            .filter(|card| card.has_been_reviewed())
            .map(|card| ReviewRecord::new(card.id, card.last_reviewed_at, true))
            .collect()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn seven_cards_three_overdue() -> Vec<ReviewableCard> {
        let now = noon();
        let reviewed = now - Duration::hours(2);
        (0..7)
            .map(|i| {
                let next = if i < 3 {
                    now - Duration::minutes(30)
                } else {
                    now + Duration::days(1)
                };
                reviewed_card(i, 2, i as u32 % 3, reviewed, next)
            })
            .collect()
    }

    #[test]
    fn test_due_and_total_counts() {
        let cards = seven_cards_three_overdue();
        let stats = compute_statistics(
            &cards,
            &latest_reviews(&cards),
            noon(),
            &StatisticsConfig::default(),
        );

        assert_eq!(stats.total_flashcards, 7);
        assert_eq!(stats.due_count, 3);
        assert_eq!(stats.reviews_per_day.values().sum::<usize>(), 7);
        assert_eq!(stats.streak_days, 1);
    }

    #[test]
    fn test_order_does_not_matter() {
        let config = StatisticsConfig::default();
        let cards = seven_cards_three_overdue();
        let mut history = latest_reviews(&cards);
        history.push(ReviewRecord::new(1, noon() - Duration::days(1), false));
        let expected = compute_statistics(&cards, &history, noon(), &config);

        let mut reversed = cards.clone();
        reversed.reverse();
        let mut reversed_history = history.clone();
        reversed_history.reverse();
        assert_eq!(
            compute_statistics(&reversed, &reversed_history, noon(), &config),
            expected
        );

        let mut rotated = cards;
        rotated.rotate_left(3);
        history.rotate_left(2);
        assert_eq!(compute_statistics(&rotated, &history, noon(), &config), expected);
    }

    #[test]
    fn test_mastered_and_struggling() {
        let now = noon();
        let cards = vec![
            reviewed_card(1, 4, 1, now, now),  // 0.8 -> mastered
            reviewed_card(2, 1, 2, now, now),  // 0.33 -> struggling
            reviewed_card(3, 3, 2, now, now),  // 0.6 -> neither
            reviewed_card(4, 1, 0, now, now),  // too few reviews
            reviewed_card(5, 0, 1, now, now),  // too few reviews
        ];

        let stats = compute_statistics(&cards, &[], now, &StatisticsConfig::default());

        assert_eq!(stats.mastered_count, 1);
        assert_eq!(stats.struggling_count, 1);
        assert_eq!(stats.completed_reviews, 15);
        assert!((stats.average_score - 9.0 / 15.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_unreviewed_cards() {
        let now = noon();
        let cards = vec![ReviewableCard::new(1, now - Duration::days(1))];

        let stats = compute_statistics(&cards, &[], now, &StatisticsConfig::default());

        assert_eq!(stats.due_count, 1);
        assert_eq!(stats.completed_reviews, 0);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.streak_days, 0);
        assert!(stats.reviews_per_day.is_empty());
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let now = noon();
        let day = Duration::days(1);
        let cards = vec![
            reviewed_card(1, 1, 0, now, now + day),
            reviewed_card(2, 1, 0, now - day, now + day),
            reviewed_card(3, 1, 0, now - day * 2, now + day),
            // gap on day -3
            reviewed_card(4, 1, 0, now - day * 4, now + day),
        ];

        let stats = compute_statistics(
            &cards,
            &latest_reviews(&cards),
            now,
            &StatisticsConfig::default(),
        );
        assert_eq!(stats.streak_days, 3);
        assert_eq!(stats.reviews_per_day.len(), 4);
    }

    #[test]
    fn test_streak_zero_without_review_today() {
        let now = noon();
        let cards = vec![reviewed_card(1, 1, 0, now - Duration::days(1), now)];

        let stats = compute_statistics(
            &cards,
            &latest_reviews(&cards),
            now,
            &StatisticsConfig::default(),
        );
        assert_eq!(stats.streak_days, 0);
    }

    #[test]
    fn test_single_card_reviewed_on_consecutive_days() {
        let config = SchedulerConfig::default();
        let start = noon() - Duration::days(4);
        let mut card = ReviewableCard::new(1, start);
        let mut history = Vec::new();

        for day in 0..5 {
            let at = start + Duration::days(day);
            card = record_outcome(&card, true, at, &config);
            history.push(ReviewRecord::new(card.id, at, true));
        }

        let stats = compute_statistics(
            std::slice::from_ref(&card),
            &history,
            noon(),
            &StatisticsConfig::default(),
        );

        assert_eq!(stats.streak_days, 5);
        assert_eq!(stats.reviews_per_day.len(), 5);
        assert!(stats.reviews_per_day.values().all(|&count| count == 1));
        assert_eq!(stats.completed_reviews, 5);
    }

    #[test]
    fn test_days_follow_reference_offset() {
        // 23:30 UTC is already the next day at UTC+2
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 23, 30, 0).unwrap();
        let cards = vec![reviewed_card(1, 1, 0, now, now)];
        let config = StatisticsConfig {
            utc_offset_minutes: 120,
            ..StatisticsConfig::default()
        };

        let stats = compute_statistics(&cards, &latest_reviews(&cards), now, &config);
        let day = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
        assert_eq!(stats.reviews_per_day.get(&day), Some(&1));
        assert_eq!(stats.streak_days, 1);
    }

    #[test]
    fn test_huge_offset_falls_back_to_utc() {
        let now = noon();
        let cards = vec![reviewed_card(1, 1, 0, now, now)];
        let config = StatisticsConfig {
            utc_offset_minutes: i32::MAX,
            ..StatisticsConfig::default()
        };

        let stats = compute_statistics(&cards, &latest_reviews(&cards), now, &config);
        let day = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(stats.reviews_per_day.get(&day), Some(&1));
        assert_eq!(stats.streak_days, 1);
    }
}
