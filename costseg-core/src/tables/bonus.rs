//! Bonus-depreciation schedule.
//!
//! The first-year bonus rate depends only on the date property is placed in
//! service. The statutory schedule is a contiguous run of date ranges from
//! 1900-01-01 through 2099-12-31.

use std::sync::LazyLock;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a bonus schedule fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BonusScheduleError {
    #[error("bonus schedule has no ranges")]
    Empty,

    #[error("bonus range {start}..={end} ends before it starts")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("bonus range rate {rate} for {start} is outside [0, 1]")]
    RateOutOfRange { start: NaiveDate, rate: Decimal },

    #[error("bonus schedule has a gap between {previous_end} and {next_start}")]
    Gap { previous_end: NaiveDate, next_start: NaiveDate },

    #[error("bonus range starting {next_start} overlaps the range ending {previous_end}")]
    Overlap { previous_end: NaiveDate, next_start: NaiveDate },
}

/// Inclusive date range sharing one bonus rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rate: Decimal,
}

impl BonusRange {
    pub fn contains(
        &self,
        date: NaiveDate,
    ) -> bool {
        self.start <= date && date <= self.end
    }
}

/// An ordered, gap-free, non-overlapping list of [`BonusRange`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BonusSchedule {
    ranges: Vec<BonusRange>,
}

static STATUTORY: LazyLock<BonusSchedule> = LazyLock::new(|| {
    BonusSchedule::new(statutory_ranges()).expect("statutory bonus schedule is contiguous")
});

impl BonusSchedule {
    /// Validates and wraps `ranges`, which must already be sorted by start.
    ///
    /// # Errors
    ///
    /// Returns [`BonusScheduleError`] if the list is empty, a range ends
    /// before it starts, a rate falls outside `[0, 1]`, or consecutive ranges
    /// leave a gap or overlap.
    pub fn new(ranges: Vec<BonusRange>) -> Result<Self, BonusScheduleError> {
        if ranges.is_empty() {
            return Err(BonusScheduleError::Empty);
        }

        for range in &ranges {
            if range.end < range.start {
                return Err(BonusScheduleError::InvertedRange {
                    start: range.start,
                    end: range.end,
                });
            }
            if range.rate < Decimal::ZERO || range.rate > Decimal::ONE {
                return Err(BonusScheduleError::RateOutOfRange {
                    start: range.start,
                    rate: range.rate,
                });
            }
        }

        for pair in ranges.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if next.start <= previous.end {
                return Err(BonusScheduleError::Overlap {
                    previous_end: previous.end,
                    next_start: next.start,
                });
            }
            if previous.end.succ_opt() != Some(next.start) {
                return Err(BonusScheduleError::Gap {
                    previous_end: previous.end,
                    next_start: next.start,
                });
            }
        }

        Ok(Self { ranges })
    }

    /// The schedule enacted through early 2025.
    pub fn statutory() -> &'static Self {
        &STATUTORY
    }

    pub fn ranges(&self) -> &[BonusRange] {
        &self.ranges
    }

    /// Bonus rate for property placed in service on `date`; zero when no
    /// range covers it.
    pub fn rate_for(
        &self,
        date: NaiveDate,
    ) -> Decimal {
        self.ranges
            .iter()
            .find(|range| range.contains(date))
            .map_or(Decimal::ZERO, |range| range.rate)
    }
}

fn ymd(
    year: i32,
    month: u32,
    day: u32,
) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn range(
    start: NaiveDate,
    end: NaiveDate,
    rate: Decimal,
) -> BonusRange {
    BonusRange { start, end, rate }
}

fn statutory_ranges() -> Vec<BonusRange> {
    vec![
        range(ymd(1900, 1, 1), ymd(2001, 9, 10), dec!(0)),
        range(ymd(2001, 9, 11), ymd(2003, 5, 5), dec!(0.30)),
        range(ymd(2003, 5, 6), ymd(2004, 12, 31), dec!(0.50)),
        range(ymd(2005, 1, 1), ymd(2007, 12, 31), dec!(0)),
        range(ymd(2008, 1, 1), ymd(2010, 9, 8), dec!(0.50)),
        range(ymd(2010, 9, 9), ymd(2011, 12, 31), dec!(1.00)),
        range(ymd(2012, 1, 1), ymd(2017, 9, 27), dec!(0.50)),
        range(ymd(2017, 9, 28), ymd(2022, 12, 31), dec!(1.00)),
        range(ymd(2023, 1, 1), ymd(2023, 12, 31), dec!(0.80)),
        range(ymd(2024, 1, 1), ymd(2024, 12, 31), dec!(0.60)),
        range(ymd(2025, 1, 1), ymd(2025, 1, 19), dec!(0.40)),
        range(ymd(2025, 1, 20), ymd(2099, 12, 31), dec!(0)),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rate_on(
        year: i32,
        month: u32,
        day: u32,
    ) -> Decimal {
        BonusSchedule::statutory().rate_for(ymd(year, month, day))
    }

    // =========================================================================
    // statutory schedule tests
    // =========================================================================

    #[test]
    fn statutory_schedule_validates() {
        assert!(BonusSchedule::new(statutory_ranges()).is_ok());
        assert_eq!(BonusSchedule::statutory().ranges().len(), 12);
    }

    #[test]
    fn statutory_schedule_spans_the_century() {
        let ranges = BonusSchedule::statutory().ranges();

        assert_eq!(ranges.first().map(|r| r.start), Some(ymd(1900, 1, 1)));
        assert_eq!(ranges.last().map(|r| r.end), Some(ymd(2099, 12, 31)));
    }

    #[test]
    fn rate_for_follows_range_boundaries() {
        assert_eq!(rate_on(2001, 9, 10), dec!(0));
        assert_eq!(rate_on(2001, 9, 11), dec!(0.30));
        assert_eq!(rate_on(2017, 9, 27), dec!(0.50));
        assert_eq!(rate_on(2017, 9, 28), dec!(1.00));
        assert_eq!(rate_on(2025, 1, 19), dec!(0.40));
        assert_eq!(rate_on(2025, 1, 20), dec!(0));
    }

    #[test]
    fn rate_for_recent_years() {
        assert_eq!(rate_on(2021, 1, 1), dec!(1.00));
        assert_eq!(rate_on(2023, 7, 15), dec!(0.80));
        assert_eq!(rate_on(2024, 3, 1), dec!(0.60));
    }

    #[test]
    fn rate_for_outside_schedule_is_zero() {
        assert_eq!(rate_on(1850, 6, 1), dec!(0));
        assert_eq!(rate_on(2150, 6, 1), dec!(0));
    }

    // =========================================================================
    // validation tests
    // =========================================================================

    #[test]
    fn new_rejects_empty_schedule() {
        assert_eq!(BonusSchedule::new(Vec::new()), Err(BonusScheduleError::Empty));
    }

    #[test]
    fn new_rejects_inverted_range() {
        let result = BonusSchedule::new(vec![range(ymd(2020, 1, 2), ymd(2020, 1, 1), dec!(0))]);

        assert_eq!(
            result,
            Err(BonusScheduleError::InvertedRange {
                start: ymd(2020, 1, 2),
                end: ymd(2020, 1, 1),
            })
        );
    }

    #[test]
    fn new_rejects_rate_above_one() {
        let result = BonusSchedule::new(vec![range(ymd(2020, 1, 1), ymd(2020, 12, 31), dec!(1.5))]);

        assert_eq!(
            result,
            Err(BonusScheduleError::RateOutOfRange {
                start: ymd(2020, 1, 1),
                rate: dec!(1.5),
            })
        );
    }

    #[test]
    fn new_rejects_gaps() {
        let result = BonusSchedule::new(vec![
            range(ymd(2020, 1, 1), ymd(2020, 6, 30), dec!(0.5)),
            range(ymd(2020, 7, 2), ymd(2020, 12, 31), dec!(0.5)),
        ]);

        assert_eq!(
            result,
            Err(BonusScheduleError::Gap {
                previous_end: ymd(2020, 6, 30),
                next_start: ymd(2020, 7, 2),
            })
        );
    }

    #[test]
    fn new_rejects_overlaps() {
        let result = BonusSchedule::new(vec![
            range(ymd(2020, 1, 1), ymd(2020, 6, 30), dec!(0.5)),
            range(ymd(2020, 6, 30), ymd(2020, 12, 31), dec!(1)),
        ]);

        assert_eq!(
            result,
            Err(BonusScheduleError::Overlap {
                previous_end: ymd(2020, 6, 30),
                next_start: ymd(2020, 6, 30),
            })
        );
    }

    #[test]
    fn custom_schedule_is_usable() {
        let schedule = BonusSchedule::new(vec![
            range(ymd(2020, 1, 1), ymd(2020, 12, 31), dec!(0.25)),
            range(ymd(2021, 1, 1), ymd(2021, 12, 31), dec!(0.75)),
        ])
        .unwrap();

        assert_eq!(schedule.rate_for(ymd(2021, 5, 5)), dec!(0.75));
        assert_eq!(schedule.rate_for(ymd(2022, 5, 5)), dec!(0));
    }
}
