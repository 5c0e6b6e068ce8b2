use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use super::AssetClass;

/// One calendar year of a depreciation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookbackRow {
    pub calendar_year: i32,
    /// 1-based row of the recovery table applied this year.
    pub table_year: u32,
    pub rate: Decimal,
    /// Whole-dollar depreciation for the year.
    pub depreciation: Decimal,
    /// Whole-dollar depreciation through this year, bonus included.
    pub cumulative: Decimal,
}

/// Schedule for a single basis in a single asset class, truncated at the
/// study year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookbackResult {
    pub original_basis: Decimal,
    pub bonus_rate: Decimal,
    pub bonus_amount: Decimal,
    pub depreciable_basis: Decimal,
    pub current_year_depreciation: Decimal,
    pub cumulative_depreciation: Decimal,
    pub net_book_value: Decimal,
    pub rows: Vec<LookbackRow>,
}

impl LookbackResult {
    /// Zeroed result for a non-positive basis or a study year before the
    /// in-service year.
    pub(crate) fn degenerate(basis: Decimal) -> Self {
        Self {
            original_basis: basis,
            bonus_rate: Decimal::ZERO,
            bonus_amount: Decimal::ZERO,
            depreciable_basis: basis.max(Decimal::ZERO),
            current_year_depreciation: Decimal::ZERO,
            cumulative_depreciation: Decimal::ZERO,
            net_book_value: basis,
            rows: Vec::new(),
        }
    }
}

/// A [`LookbackResult`] tagged with the class it was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLookback {
    pub class: AssetClass,
    pub schedule: LookbackResult,
}

/// Lookback figures aggregated across every bucket of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookbackSummary {
    pub active: bool,
    pub in_service_date: Option<NaiveDate>,
    pub study_year: Option<i32>,
    pub years_in_service: u32,
    pub schedules: Vec<ClassLookback>,
    /// Sum across classes of the study year's depreciation.
    pub total_current_year_depreciation: Decimal,
    /// Sum across classes of depreciation through the study year.
    pub total_cumulative_depreciation: Decimal,
    /// Cumulative minus current, zero when only one year has elapsed.
    pub prior_years_depreciation: Decimal,
}

impl LookbackSummary {
    pub fn inactive(
        in_service_date: Option<NaiveDate>,
        study_year: Option<i32>,
    ) -> Self {
        Self {
            active: false,
            in_service_date,
            study_year,
            years_in_service: 0,
            schedules: Vec::new(),
            total_current_year_depreciation: Decimal::ZERO,
            total_cumulative_depreciation: Decimal::ZERO,
            prior_years_depreciation: Decimal::ZERO,
        }
    }

    pub fn active(
        in_service_date: NaiveDate,
        study_year: i32,
        schedules: Vec<ClassLookback>,
    ) -> Self {
        // Widened so extreme study years cannot overflow.
        let elapsed = i64::from(study_year) - i64::from(in_service_date.year()) + 1;
        let years_in_service = u32::try_from(elapsed).unwrap_or(0);

        let total_current_year_depreciation = schedules
            .iter()
            .map(|s| s.schedule.current_year_depreciation)
            .sum::<Decimal>();
        let total_cumulative_depreciation = schedules
            .iter()
            .map(|s| s.schedule.cumulative_depreciation)
            .sum::<Decimal>();
        let prior_years_depreciation = if years_in_service > 1 {
            total_cumulative_depreciation - total_current_year_depreciation
        } else {
            Decimal::ZERO
        };

        Self {
            active: true,
            in_service_date: Some(in_service_date),
            study_year: Some(study_year),
            years_in_service,
            schedules,
            total_current_year_depreciation,
            total_cumulative_depreciation,
            prior_years_depreciation,
        }
    }

    /// Schedule computed for `class`, if any.
    pub fn schedule(
        &self,
        class: AssetClass,
    ) -> Option<&LookbackResult> {
        self.schedules
            .iter()
            .find(|s| s.class == class)
            .map(|s| &s.schedule)
    }
}
