//! Depreciation schedule generation.
//!
//! A schedule turns one whole-dollar basis in one [`AssetClass`] into a row
//! per calendar year:
//!
//! | Step | Personal property (5/7/15)             | Buildings (27.5/39)        |
//! |------|----------------------------------------|----------------------------|
//! | 1    | bonus = round(basis × bonus rate)      | no bonus                   |
//! | 2    | depreciable = basis − bonus            | depreciable = basis        |
//! | 3    | annual = round(depreciable × half-year rate) | annual = round(depreciable × mid-month rate) |
//! | 4    | cumulative starts at the bonus         | cumulative starts at zero  |
//!
//! [`DepreciationSchedule::lookback`] stops at a study year;
//! [`DepreciationSchedule::full_schedule`] runs the whole recovery life and
//! folds the bonus into the first year instead.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use costseg_core::{AssetClass, compute_lookback};
//!
//! let in_service = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let result = compute_lookback(dec!(80000), in_service, 2024, AssetClass::FifteenYear);
//!
//! assert_eq!(result.bonus_amount, dec!(48000));
//! assert_eq!(result.current_year_depreciation, dec!(1600));
//! assert_eq!(result.cumulative_depreciation, dec!(49600));
//! assert_eq!(result.net_book_value, dec!(30400));
//! ```

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::whole_dollars;
use crate::models::{AssetClass, ClassLookback, LookbackResult, LookbackRow, LookbackSummary};
use crate::tables::{BonusSchedule, recovery_rate};

/// Schedule generator bound to a bonus schedule.
#[derive(Debug, Clone, Copy)]
pub struct DepreciationSchedule<'a> {
    bonus: &'a BonusSchedule,
}

impl Default for DepreciationSchedule<'static> {
    fn default() -> Self {
        Self::statutory()
    }
}

impl<'a> DepreciationSchedule<'a> {
    pub fn new(bonus: &'a BonusSchedule) -> Self {
        Self { bonus }
    }

    /// Generator using [`BonusSchedule::statutory`].
    pub fn statutory() -> DepreciationSchedule<'static> {
        DepreciationSchedule {
            bonus: BonusSchedule::statutory(),
        }
    }

    /// Bonus rate applied to `class` placed in service on `in_service`.
    /// Always zero for buildings.
    pub fn bonus_rate(
        &self,
        class: AssetClass,
        in_service: NaiveDate,
    ) -> Decimal {
        if class.is_building() {
            Decimal::ZERO
        } else {
            self.bonus.rate_for(in_service)
        }
    }

    /// Schedule from the in-service year through `study_year` inclusive.
    ///
    /// The basis is rounded to whole dollars first. A non-positive basis or a
    /// study year before the in-service year yields an empty, zeroed result.
    /// Rows stop once the class's recovery table is exhausted, so a study year
    /// past the recovery life has no current-year depreciation.
    pub fn lookback(
        &self,
        basis: Decimal,
        in_service: NaiveDate,
        study_year: i32,
        class: AssetClass,
    ) -> LookbackResult {
        let basis = whole_dollars(basis);
        if basis <= Decimal::ZERO || study_year < in_service.year() {
            debug!(
                %basis,
                %in_service,
                study_year,
                %class,
                "degenerate lookback, returning zeroed schedule"
            );
            return LookbackResult::degenerate(basis);
        }

        let (bonus_rate, bonus_amount, depreciable_basis) = self.split_bonus(basis, in_service, class);
        let month = in_service.month();
        let max_years = class.max_table_years();

        let mut cumulative = bonus_amount;
        let mut current_year_depreciation = Decimal::ZERO;
        let mut rows = Vec::new();

        for (table_year, calendar_year) in (1..=max_years).zip(in_service.year()..=study_year) {
            let rate = recovery_rate(class, table_year, month);
            let depreciation = whole_dollars(depreciable_basis * rate);
            cumulative += depreciation;

            if calendar_year == study_year {
                current_year_depreciation = depreciation;
            }

            rows.push(LookbackRow {
                calendar_year,
                table_year,
                rate,
                depreciation,
                cumulative,
            });
        }

        LookbackResult {
            original_basis: basis,
            bonus_rate,
            bonus_amount,
            depreciable_basis,
            current_year_depreciation,
            cumulative_depreciation: cumulative,
            net_book_value: whole_dollars(basis - cumulative),
            rows,
        }
    }

    /// Depreciation by calendar year over the whole recovery life.
    ///
    /// For personal property the bonus is added to the first year. Empty for
    /// a non-positive basis.
    pub fn full_schedule(
        &self,
        basis: Decimal,
        in_service: NaiveDate,
        class: AssetClass,
    ) -> BTreeMap<i32, Decimal> {
        let basis = whole_dollars(basis);
        if basis <= Decimal::ZERO {
            debug!(%basis, %class, "non-positive basis, empty full schedule");
            return BTreeMap::new();
        }

        let (_, bonus_amount, depreciable_basis) = self.split_bonus(basis, in_service, class);
        let month = in_service.month();

        (1..=class.max_table_years())
            .zip(in_service.year()..)
            .map(|(table_year, calendar_year)| {
                let mut amount =
                    whole_dollars(depreciable_basis * recovery_rate(class, table_year, month));
                if table_year == 1 {
                    amount += bonus_amount;
                }
                (calendar_year, amount)
            })
            .collect()
    }

    /// Lookbacks for every bucket of an allocation, aggregated.
    ///
    /// Buckets keep their order in the returned summary.
    pub fn summarize(
        &self,
        buckets: &[(AssetClass, Decimal)],
        in_service: NaiveDate,
        study_year: i32,
    ) -> LookbackSummary {
        let schedules = buckets
            .iter()
            .map(|&(class, basis)| ClassLookback {
                class,
                schedule: self.lookback(basis, in_service, study_year, class),
            })
            .collect();

        LookbackSummary::active(in_service, study_year, schedules)
    }

    /// Returns `(bonus rate, bonus amount, depreciable basis)`.
    fn split_bonus(
        &self,
        basis: Decimal,
        in_service: NaiveDate,
        class: AssetClass,
    ) -> (Decimal, Decimal, Decimal) {
        let rate = self.bonus_rate(class, in_service);
        let amount = whole_dollars(basis * rate);
        (rate, amount, basis - amount)
    }
}

/// [`DepreciationSchedule::lookback`] with the statutory bonus schedule.
pub fn compute_lookback(
    basis: Decimal,
    in_service: NaiveDate,
    study_year: i32,
    class: AssetClass,
) -> LookbackResult {
    DepreciationSchedule::statutory().lookback(basis, in_service, study_year, class)
}

/// [`DepreciationSchedule::full_schedule`] with the statutory bonus schedule.
pub fn compute_full_schedule(
    basis: Decimal,
    in_service: NaiveDate,
    class: AssetClass,
) -> BTreeMap<i32, Decimal> {
    DepreciationSchedule::statutory().full_schedule(basis, in_service, class)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::tables::BonusRange;

    fn ymd(
        year: i32,
        month: u32,
        day: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn amounts(result: &LookbackResult) -> Vec<Decimal> {
        result.rows.iter().map(|row| row.depreciation).collect()
    }

    // =========================================================================
    // degenerate lookbacks
    // =========================================================================

    #[test]
    fn zero_basis_yields_empty_schedule() {
        let result = compute_lookback(dec!(0), ymd(2020, 5, 1), 2025, AssetClass::FiveYear);

        assert!(result.rows.is_empty());
        assert_eq!(result.bonus_amount, dec!(0));
        assert_eq!(result.current_year_depreciation, dec!(0));
        assert_eq!(result.cumulative_depreciation, dec!(0));
        assert_eq!(result.net_book_value, dec!(0));
    }

    #[test]
    fn basis_rounding_to_zero_is_degenerate() {
        let result = compute_lookback(dec!(0.4), ymd(2020, 5, 1), 2025, AssetClass::Nonresidential);

        assert!(result.rows.is_empty());
        assert_eq!(result.original_basis, dec!(0));
    }

    #[test]
    fn study_year_before_service_is_degenerate() {
        let result = compute_lookback(dec!(100000), ymd(2024, 5, 1), 2023, AssetClass::SevenYear);

        assert!(result.rows.is_empty());
        assert_eq!(result.bonus_rate, dec!(0));
        assert_eq!(result.depreciable_basis, dec!(100000));
        assert_eq!(result.net_book_value, dec!(100000));
    }

    // =========================================================================
    // building lookbacks
    // =========================================================================

    #[test]
    fn residential_building_lookback() {
        let result = compute_lookback(
            dec!(486651),
            ymd(2021, 1, 1),
            2025,
            AssetClass::ResidentialRental,
        );

        assert_eq!(result.bonus_amount, dec!(0));
        assert_eq!(result.depreciable_basis, dec!(486651));
        assert_eq!(
            amounts(&result),
            vec![dec!(16960), dec!(17695), dec!(17695), dec!(17695), dec!(17695)]
        );
        assert_eq!(result.current_year_depreciation, dec!(17695));
        assert_eq!(result.cumulative_depreciation, dec!(87740));
        assert_eq!(result.net_book_value, dec!(398911));
    }

    #[test]
    fn nonresidential_lookback_uses_in_service_month() {
        let result = compute_lookback(dec!(1980000), ymd(2018, 6, 15), 2025, AssetClass::Nonresidential);

        assert_eq!(result.rows.len(), 8);
        assert_eq!(result.rows[0].rate, dec!(0.01391));
        assert_eq!(result.rows[0].depreciation, dec!(27542));
        assert_eq!(result.rows[7].depreciation, dec!(50767));
        assert_eq!(result.cumulative_depreciation, dec!(382911));
        assert_eq!(result.net_book_value, dec!(1597089));
    }

    #[test]
    fn building_never_takes_bonus() {
        let schedule = DepreciationSchedule::statutory();

        assert_eq!(schedule.bonus_rate(AssetClass::Nonresidential, ymd(2021, 1, 1)), dec!(0));
        assert_eq!(schedule.bonus_rate(AssetClass::FiveYear, ymd(2021, 1, 1)), dec!(1));
    }

    // =========================================================================
    // personal-property lookbacks
    // =========================================================================

    #[test]
    fn full_bonus_leaves_nothing_to_depreciate() {
        let result = compute_lookback(dec!(142585), ymd(2021, 1, 1), 2025, AssetClass::FiveYear);

        assert_eq!(result.bonus_amount, dec!(142585));
        assert_eq!(result.depreciable_basis, dec!(0));
        assert_eq!(amounts(&result), vec![dec!(0); 5]);
        assert_eq!(result.cumulative_depreciation, dec!(142585));
        assert_eq!(result.net_book_value, dec!(0));
    }

    #[test]
    fn partial_bonus_then_half_year_rates() {
        let result = compute_lookback(dec!(61503), ymd(2023, 7, 15), 2024, AssetClass::FiveYear);

        assert_eq!(result.bonus_rate, dec!(0.80));
        assert_eq!(result.bonus_amount, dec!(49202));
        assert_eq!(result.depreciable_basis, dec!(12301));
        assert_eq!(amounts(&result), vec![dec!(2460), dec!(3936)]);
        assert_eq!(result.rows[1].cumulative, dec!(55598));
        assert_eq!(result.current_year_depreciation, dec!(3936));
    }

    #[test]
    fn rows_stop_at_end_of_recovery_table() {
        let result = compute_lookback(dec!(10000), ymd(2005, 3, 1), 2030, AssetClass::FiveYear);

        assert_eq!(result.rows.len(), 6);
        assert_eq!(result.rows.last().map(|r| r.calendar_year), Some(2010));
        assert_eq!(result.current_year_depreciation, dec!(0));
        assert_eq!(result.cumulative_depreciation, dec!(10000));
        assert_eq!(result.net_book_value, dec!(0));
    }

    #[test]
    fn rows_are_numbered_from_one() {
        let result = compute_lookback(dec!(10000), ymd(2005, 3, 1), 2007, AssetClass::SevenYear);

        let years: Vec<(i32, u32)> = result
            .rows
            .iter()
            .map(|row| (row.calendar_year, row.table_year))
            .collect();
        assert_eq!(years, vec![(2005, 1), (2006, 2), (2007, 3)]);
    }

    #[test]
    fn custom_bonus_schedule_is_honoured() {
        let bonus = BonusSchedule::new(vec![BonusRange {
            start: ymd(2000, 1, 1),
            end: ymd(2030, 12, 31),
            rate: dec!(0.25),
        }])
        .unwrap();
        let schedule = DepreciationSchedule::new(&bonus);

        let result = schedule.lookback(dec!(1000), ymd(2021, 1, 1), 2021, AssetClass::FiveYear);

        assert_eq!(result.bonus_amount, dec!(250));
        assert_eq!(result.current_year_depreciation, dec!(150));
    }

    // =========================================================================
    // full schedules
    // =========================================================================

    #[test]
    fn full_schedule_folds_bonus_into_first_year() {
        let schedule = compute_full_schedule(dec!(80000), ymd(2024, 3, 1), AssetClass::FifteenYear);

        assert_eq!(schedule.len(), 16);
        assert_eq!(schedule.get(&2024), Some(&dec!(49600)));
        assert_eq!(schedule.get(&2025), Some(&dec!(3040)));
        assert_eq!(schedule.keys().last(), Some(&2039));
    }

    #[test]
    fn full_schedule_matches_lookback_rows() {
        let in_service = ymd(2018, 6, 15);
        let full = compute_full_schedule(dec!(1980000), in_service, AssetClass::Nonresidential);
        let lookback = compute_lookback(dec!(1980000), in_service, 2025, AssetClass::Nonresidential);

        assert_eq!(full.len(), 40);
        for row in &lookback.rows {
            assert_eq!(full.get(&row.calendar_year), Some(&row.depreciation));
        }
    }

    #[test]
    fn full_schedule_matches_lookback_with_bonus_in_first_year() {
        let in_service = ymd(2023, 7, 15);
        for class in [AssetClass::FiveYear, AssetClass::SevenYear, AssetClass::FifteenYear] {
            let full = compute_full_schedule(dec!(61503), in_service, class);
            let lookback = compute_lookback(dec!(61503), in_service, 2040, class);

            assert!(lookback.bonus_amount > dec!(0), "{class}");
            assert_eq!(full.len(), lookback.rows.len(), "{class}");

            let (first, later) = lookback.rows.split_first().unwrap();
            assert_eq!(
                full.get(&first.calendar_year),
                Some(&(lookback.bonus_amount + first.depreciation)),
                "{class}"
            );
            for row in later {
                assert_eq!(full.get(&row.calendar_year), Some(&row.depreciation), "{class}");
            }
        }
    }

    #[test]
    fn full_schedule_of_zero_basis_is_empty() {
        assert!(compute_full_schedule(dec!(0), ymd(2024, 1, 1), AssetClass::FiveYear).is_empty());
    }

    // =========================================================================
    // summaries
    // =========================================================================

    #[test]
    fn summarize_aggregates_buckets_in_order() {
        let summary = DepreciationSchedule::statutory().summarize(
            &[
                (AssetClass::ResidentialRental, dec!(486651)),
                (AssetClass::FiveYear, dec!(142585)),
                (AssetClass::FifteenYear, dec!(70764)),
            ],
            ymd(2021, 1, 1),
            2025,
        );

        assert!(summary.active);
        assert_eq!(summary.years_in_service, 5);
        assert_eq!(summary.schedules[0].class, AssetClass::ResidentialRental);
        assert_eq!(summary.total_current_year_depreciation, dec!(17695));
        assert_eq!(summary.total_cumulative_depreciation, dec!(301089));
        assert_eq!(summary.prior_years_depreciation, dec!(283394));
    }
}
