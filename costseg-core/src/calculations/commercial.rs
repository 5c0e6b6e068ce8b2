//! Commercial cost-segregation estimator.
//!
//! Commercial properties are split by a guideline table: the property type
//! selects a row of 39/15/7/5-year fractions, each fraction is applied to the
//! basis independently, and the rounding slack is pushed into the 39-year
//! bucket so the four amounts always add back to the rounded basis.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use costseg_core::{CommercialInput, GuidelineTable, compute_commercial};
//!
//! let table = GuidelineTable::new(
//!     ["Property Type", "39-yr", "15-yr", "7-yr", "5-yr"],
//!     [["Bank", "0.72", "0.09", "0.03", "0.16"]],
//! )
//! .unwrap();
//! let input = CommercialInput {
//!     basis: dec!(2750000),
//!     ..CommercialInput::default()
//! };
//!
//! let result = compute_commercial(&input, &table);
//!
//! assert!(!result.lookup_failed);
//! assert_eq!(result.allocation.nonresidential, dec!(1980000));
//! assert_eq!(result.allocation.five_year, dec!(440000));
//! assert!(!result.lookback.active);
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculations::common::{bounded_amount, percent, whole_dollars};
use crate::calculations::schedule::DepreciationSchedule;
use crate::models::{
    AssetClass, FIFTEEN_YEAR_HEADERS, FIVE_YEAR_HEADERS, GuidelineRow, GuidelineTable,
    LookbackSummary, NONRESIDENTIAL_HEADERS, SEVEN_YEAR_HEADERS, TOTAL_ACCELERATED_HEADERS,
};

/// Normalised commercial request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommercialInput {
    pub basis: Decimal,
    pub property_type: String,
    pub in_service_date: Option<NaiveDate>,
    pub study_year: Option<i32>,
    pub property_address: Option<String>,
}

impl Default for CommercialInput {
    fn default() -> Self {
        Self {
            basis: dec!(1000000),
            property_type: "Bank".to_string(),
            in_service_date: None,
            study_year: None,
            property_address: None,
        }
    }
}

/// Fractions read from the matched guideline row, each in `[0, 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GuidelineFractions {
    pub nonresidential: Decimal,
    pub fifteen_year: Decimal,
    pub seven_year: Decimal,
    pub five_year: Decimal,
    /// Read from the table when present, otherwise 5 + 7 + 15.
    pub total_accelerated: Decimal,
}

impl GuidelineFractions {
    fn from_row(row: &GuidelineRow) -> Self {
        let nonresidential = row.fraction(&NONRESIDENTIAL_HEADERS, Decimal::ZERO);
        let fifteen_year = row.fraction(&FIFTEEN_YEAR_HEADERS, Decimal::ZERO);
        let seven_year = row.fraction(&SEVEN_YEAR_HEADERS, Decimal::ZERO);
        let five_year = row.fraction(&FIVE_YEAR_HEADERS, Decimal::ZERO);
        let total_accelerated =
            row.fraction(&TOTAL_ACCELERATED_HEADERS, five_year + seven_year + fifteen_year);

        Self {
            nonresidential,
            fifteen_year,
            seven_year,
            five_year,
            total_accelerated,
        }
    }
}

/// Whole-dollar amounts per class and their share of the basis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommercialAllocation {
    pub nonresidential: Decimal,
    pub fifteen_year: Decimal,
    pub seven_year: Decimal,
    pub five_year: Decimal,
    /// Rounding slack already added to `nonresidential`.
    pub rounding_adjustment: Decimal,
    pub nonresidential_pct: Decimal,
    pub fifteen_year_pct: Decimal,
    pub seven_year_pct: Decimal,
    pub five_year_pct: Decimal,
    pub accelerated_pct: Decimal,
}

impl CommercialAllocation {
    /// 15 + 7 + 5-year amounts.
    pub fn accelerated(&self) -> Decimal {
        self.fifteen_year + self.seven_year + self.five_year
    }

    pub fn total(&self) -> Decimal {
        self.nonresidential + self.accelerated()
    }

    pub fn buckets(&self) -> [(AssetClass, Decimal); 4] {
        [
            (AssetClass::Nonresidential, self.nonresidential),
            (AssetClass::FifteenYear, self.fifteen_year),
            (AssetClass::SevenYear, self.seven_year),
            (AssetClass::FiveYear, self.five_year),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommercialResult {
    /// The request as allocated. A negative or oversized basis is already
    /// zeroed here.
    pub input: CommercialInput,
    /// Set when no guideline row matches the property type. Every amount is
    /// zero and the lookback is inactive.
    pub lookup_failed: bool,
    pub matched_property_type: Option<String>,
    pub dep_life: Option<String>,
    pub fractions: GuidelineFractions,
    pub allocation: CommercialAllocation,
    pub lookback: LookbackSummary,
}

/// Commercial estimator bound to a schedule generator.
#[derive(Debug, Clone, Copy)]
pub struct CommercialEstimator<'a> {
    schedule: DepreciationSchedule<'a>,
}

impl Default for CommercialEstimator<'static> {
    fn default() -> Self {
        Self::new(DepreciationSchedule::statutory())
    }
}

impl<'a> CommercialEstimator<'a> {
    pub fn new(schedule: DepreciationSchedule<'a>) -> Self {
        Self { schedule }
    }

    pub fn calculate(
        &self,
        input: &CommercialInput,
        guidelines: &GuidelineTable,
    ) -> CommercialResult {
        let input = &CommercialInput {
            basis: bounded_amount("basis", input.basis),
            ..input.clone()
        };
        let basis = input.basis;

        let Some(found) = guidelines.find(&input.property_type) else {
            info!(property_type = %input.property_type, "no guideline row for property type");
            return CommercialResult {
                input: input.clone(),
                lookup_failed: true,
                matched_property_type: None,
                dep_life: None,
                fractions: GuidelineFractions::default(),
                allocation: CommercialAllocation::default(),
                lookback: LookbackSummary::inactive(None, None),
            };
        };
        let row = found.row();
        debug!(
            query = %input.property_type,
            matched = %row.property_type(),
            "guideline row matched"
        );

        let fractions = GuidelineFractions::from_row(row);
        let allocation = self.allocate(basis, &fractions);

        // Both fields are required; neither is defaulted.
        let lookback = match (input.in_service_date, input.study_year) {
            (Some(in_service), Some(study_year)) => {
                self.schedule
                    .summarize(&allocation.buckets(), in_service, study_year)
            }
            (in_service, study_year) => LookbackSummary::inactive(in_service, study_year),
        };

        CommercialResult {
            input: input.clone(),
            lookup_failed: false,
            matched_property_type: Some(row.property_type().to_string()),
            dep_life: row.dep_life(),
            fractions,
            allocation,
            lookback,
        }
    }

    fn allocate(
        &self,
        basis: Decimal,
        fractions: &GuidelineFractions,
    ) -> CommercialAllocation {
        let mut nonresidential = whole_dollars(basis * fractions.nonresidential);
        let fifteen_year = whole_dollars(basis * fractions.fifteen_year);
        let seven_year = whole_dollars(basis * fractions.seven_year);
        let five_year = whole_dollars(basis * fractions.five_year);

        // Buckets always sum to the rounded basis, even for half-dollar bases.
        let rounding_adjustment =
            whole_dollars(basis) - (nonresidential + fifteen_year + seven_year + five_year);
        if !rounding_adjustment.is_zero() {
            debug!(%rounding_adjustment, "rounding slack added to 39-year bucket");
            nonresidential += rounding_adjustment;
        }

        let share = |amount: Decimal| {
            if basis > Decimal::ZERO {
                percent(amount / basis)
            } else {
                Decimal::ZERO
            }
        };

        CommercialAllocation {
            nonresidential,
            fifteen_year,
            seven_year,
            five_year,
            rounding_adjustment,
            nonresidential_pct: share(nonresidential),
            fifteen_year_pct: share(fifteen_year),
            seven_year_pct: share(seven_year),
            five_year_pct: share(five_year),
            accelerated_pct: share(fifteen_year + seven_year + five_year),
        }
    }
}

/// Runs the commercial estimator with the statutory bonus schedule.
pub fn compute_commercial(
    input: &CommercialInput,
    guidelines: &GuidelineTable,
) -> CommercialResult {
    CommercialEstimator::default().calculate(input, guidelines)
}
