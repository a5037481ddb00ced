//! Fixed ladder of review intervals.
//!
//! A card climbs one rung per correct answer and falls back on a wrong one.
//! `ThreeMonths` is the top rung: further successes keep re-applying it.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReviewStage {
    Initial,
    TenMinutes,
    OneHour,
    OneDay,
    OneWeek,
    OneMonth,
    ThreeMonths,
}

impl Default for ReviewStage {
    fn default() -> Self {
        Self::Initial
    }
}

impl ReviewStage {
    /// All stages in ladder order.
    pub const LADDER: [ReviewStage; 7] = [
        ReviewStage::Initial,
        ReviewStage::TenMinutes,
        ReviewStage::OneHour,
        ReviewStage::OneDay,
        ReviewStage::OneWeek,
        ReviewStage::OneMonth,
        ReviewStage::ThreeMonths,
    ];

    /// Minutes until the next review once a card sits on this stage.
    pub fn interval_minutes(self) -> i64 {
        match self {
            ReviewStage::Initial => 0,
            ReviewStage::TenMinutes => 10,
            ReviewStage::OneHour => 60,
            ReviewStage::OneDay => 1_440,
            ReviewStage::OneWeek => 10_080,
            ReviewStage::OneMonth => 43_200,
            ReviewStage::ThreeMonths => 129_600,
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::LADDER.get(ordinal).copied()
    }

    /// One rung up, clamped at the top.
    pub fn next(self) -> Self {
        Self::from_ordinal(self.ordinal() + 1).unwrap_or(ReviewStage::ThreeMonths)
    }

    /// One rung down, clamped at `Initial`.
    pub fn previous(self) -> Self {
        self.ordinal()
            .checked_sub(1)
            .and_then(Self::from_ordinal)
            .unwrap_or(ReviewStage::Initial)
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewStage::Initial => "new",
            ReviewStage::TenMinutes => "10 minutes",
            ReviewStage::OneHour => "1 hour",
            ReviewStage::OneDay => "1 day",
            ReviewStage::OneWeek => "1 week",
            ReviewStage::OneMonth => "1 month",
            ReviewStage::ThreeMonths => "3 months",
        }
    }
}

impl ToSql for ReviewStage {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.ordinal() as i64))
    }
}

impl FromSql for ReviewStage {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_i64()?;
        usize::try_from(raw)
            .ok()
            .and_then(ReviewStage::from_ordinal)
            .ok_or(FromSqlError::OutOfRange(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_intervals_increase() {
        for pair in ReviewStage::LADDER.windows(2) {
            assert!(pair[0].interval_minutes() < pair[1].interval_minutes());
        }
    }

    #[test]
    fn test_next_clamps_at_three_months() {
        assert_eq!(ReviewStage::Initial.next(), ReviewStage::TenMinutes);
        assert_eq!(ReviewStage::OneMonth.next(), ReviewStage::ThreeMonths);
        assert_eq!(ReviewStage::ThreeMonths.next(), ReviewStage::ThreeMonths);
    }

    #[test]
    fn test_previous_clamps_at_initial() {
        assert_eq!(ReviewStage::OneWeek.previous(), ReviewStage::OneDay);
        assert_eq!(ReviewStage::Initial.previous(), ReviewStage::Initial);
    }

    #[test]
    fn test_ordinal_lookup() {
        for stage in ReviewStage::LADDER {
            assert_eq!(ReviewStage::from_ordinal(stage.ordinal()), Some(stage));
        }
        assert_eq!(ReviewStage::from_ordinal(7), None);
    }
}
