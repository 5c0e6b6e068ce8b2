//! Estimator document projection.
//!
//! Renderers consume a flat `{summary, yearly}` view rather than the full
//! results. `yearly` maps a calendar year to the depreciation of each bucket
//! present that year, keyed `5yr`, `7yr`, `15yr` and `long`, plus the derived
//! `with_css` (sum of present buckets) and `without_css` (building only).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::calculations::commercial::CommercialResult;
use crate::calculations::common::whole_dollars;
use crate::calculations::residential::ResidentialResult;
use crate::models::{AssetClass, LookbackSummary};

/// Rate applied to the "tax savings" lines unless configured otherwise.
pub const DEFAULT_TAX_SAVINGS_RATE: Decimal = dec!(0.40);

pub const LAND_ALLOCATION_TEXT: &str = "Per Depreciation Schedule";

const COMMERCIAL_BUILDING_USE: &str = "Commercial";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimatorSummary {
    pub property_address: String,
    pub building_use: String,
    pub date_placed_in_service: Option<NaiveDate>,
    /// The basis the allocator ran on, in whole dollars.
    pub cost_basis: Decimal,
    pub land_allocation_text: String,
    pub land_allocation_amount: Option<Decimal>,
    pub building_basis: Decimal,
    pub improvements_included: Decimal,
    pub basis_for_cost_segregation: Decimal,
    pub total_accelerated: Decimal,
    pub tax_savings_total_accelerated: Decimal,
    pub estimated_additional_depreciation: Decimal,
    pub tax_savings_additional_depreciation: Decimal,
}

/// One year of the projection. Buckets with no schedule row that year are
/// `None` and left out of the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct YearlyAmounts {
    #[serde(rename = "5yr", skip_serializing_if = "Option::is_none")]
    pub five_year: Option<Decimal>,
    #[serde(rename = "7yr", skip_serializing_if = "Option::is_none")]
    pub seven_year: Option<Decimal>,
    #[serde(rename = "15yr", skip_serializing_if = "Option::is_none")]
    pub fifteen_year: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_css: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub without_css: Option<Decimal>,
}

impl YearlyAmounts {
    /// Amount stored under a bucket key (`5yr`, `7yr`, `15yr`, `long`,
    /// `with_css`, `without_css`).
    pub fn get(
        &self,
        key: &str,
    ) -> Option<Decimal> {
        match key {
            "5yr" => self.five_year,
            "7yr" => self.seven_year,
            "15yr" => self.fifteen_year,
            "long" => self.long,
            "with_css" => self.with_css,
            "without_css" => self.without_css,
            _ => None,
        }
    }

    fn set(
        &mut self,
        class: AssetClass,
        amount: Decimal,
    ) {
        let slot = match class {
            AssetClass::FiveYear => &mut self.five_year,
            AssetClass::SevenYear => &mut self.seven_year,
            AssetClass::FifteenYear => &mut self.fifteen_year,
            AssetClass::ResidentialRental | AssetClass::Nonresidential => &mut self.long,
        };
        *slot = Some(amount);
    }

    fn derive_totals(&mut self) {
        let buckets = [self.five_year, self.seven_year, self.fifteen_year, self.long];
        self.with_css = buckets
            .iter()
            .flatten()
            .copied()
            .reduce(|total, amount| total + amount);
        self.without_css = self.long;
    }
}

/// The `{summary, yearly}` view of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimatorPayload {
    pub summary: EstimatorSummary,
    pub yearly: BTreeMap<i32, YearlyAmounts>,
}

impl EstimatorPayload {
    pub fn from_residential(
        result: &ResidentialResult,
        tax_savings_rate: Decimal,
    ) -> Self {
        let allocation = &result.allocation;
        let summary = Self::summary(
            result.input.property_address.as_deref(),
            result.building_type.building_use(),
            result.input.basis,
            allocation.building,
            allocation.accelerated,
            &result.lookback,
            tax_savings_rate,
        );

        Self {
            summary,
            yearly: yearly_rows(&result.lookback),
        }
    }

    pub fn from_commercial(
        result: &CommercialResult,
        tax_savings_rate: Decimal,
    ) -> Self {
        let allocation = &result.allocation;
        let summary = Self::summary(
            result.input.property_address.as_deref(),
            result
                .matched_property_type
                .as_deref()
                .unwrap_or(COMMERCIAL_BUILDING_USE),
            result.input.basis,
            allocation.nonresidential,
            allocation.accelerated(),
            &result.lookback,
            tax_savings_rate,
        );

        Self {
            summary,
            yearly: yearly_rows(&result.lookback),
        }
    }

    fn summary(
        property_address: Option<&str>,
        building_use: &str,
        cost_basis: Decimal,
        building_basis: Decimal,
        improvements_included: Decimal,
        lookback: &LookbackSummary,
        tax_savings_rate: Decimal,
    ) -> EstimatorSummary {
        let total_accelerated = lookback.total_current_year_depreciation;
        let estimated_additional_depreciation = lookback.prior_years_depreciation;

        EstimatorSummary {
            property_address: property_address.unwrap_or_default().to_string(),
            building_use: building_use.to_string(),
            date_placed_in_service: lookback.in_service_date,
            cost_basis: whole_dollars(cost_basis),
            land_allocation_text: LAND_ALLOCATION_TEXT.to_string(),
            land_allocation_amount: None,
            building_basis,
            improvements_included,
            basis_for_cost_segregation: building_basis + improvements_included,
            total_accelerated,
            tax_savings_total_accelerated: whole_dollars(total_accelerated * tax_savings_rate),
            estimated_additional_depreciation,
            tax_savings_additional_depreciation: whole_dollars(
                estimated_additional_depreciation * tax_savings_rate,
            ),
        }
    }
}

fn yearly_rows(lookback: &LookbackSummary) -> BTreeMap<i32, YearlyAmounts> {
    let mut yearly: BTreeMap<i32, YearlyAmounts> = BTreeMap::new();
    for schedule in &lookback.schedules {
        for row in &schedule.schedule.rows {
            yearly
                .entry(row.calendar_year)
                .or_default()
                .set(schedule.class, row.depreciation);
        }
    }
    for amounts in yearly.values_mut() {
        amounts.derive_totals();
    }
    yearly
}
