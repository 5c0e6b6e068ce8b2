//! Residential cost-segregation estimator.
//!
//! Splits a residential property into 5-year personal property, 15-year land
//! improvements and the 27.5-year building, then allocates the caller's basis
//! by the modeled shares.
//!
//! # Model Structure
//!
//! | Section | Description |
//! |---------|-------------|
//! | Site    | Adjusted interior area; site area split into landscape, hardscape and parking |
//! | 5-year  | Tier rate × tenant, bed, bath, adjusted interior sf and solar counts |
//! | 15-year | $2.786 landscape, $8.00 hardscape, $7.87 parking per rounded sf |
//! | Building | National average $/sf × interior sf, less the 5-year total |
//! | Allocation | Each bucket's share of the modeled total, applied to the basis |
//!
//! Every line is rounded half away from zero before it feeds the next one.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use costseg_core::{ResidentialInput, compute_residential};
//!
//! let input = ResidentialInput {
//!     tier: "SFR$$".to_string(),
//!     interior_sf: dec!(1620),
//!     basis: dec!(700000),
//!     in_service_date: NaiveDate::from_ymd_opt(2021, 1, 1),
//!     study_year: Some(2025),
//!     ..ResidentialInput::default()
//! };
//!
//! let result = compute_residential(&input);
//!
//! assert_eq!(result.allocation.building, dec!(486651));
//! assert_eq!(result.lookback.years_in_service, 5);
//! assert_eq!(result.lookback.total_current_year_depreciation, dec!(17695));
//! ```

use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{
    bounded_amount, clamp_fraction, percent, round_half_away, whole_dollars,
};
use crate::calculations::schedule::DepreciationSchedule;
use crate::models::{AssetClass, LookbackSummary};

pub const SQUARE_FEET_PER_ACRE: Decimal = dec!(43560);

/// Site improvements may never claim more than this share of the lot.
pub const MAX_SITE_FRACTION: Decimal = dec!(0.70);

pub const LANDSCAPE_RATE_PER_SF: Decimal = dec!(2.786);
pub const HARDSCAPE_RATE_PER_SF: Decimal = dec!(8.00);
pub const PARKING_RATE_PER_SF: Decimal = dec!(7.87);

/// National average $/sf forced for multi-family tiers.
pub const MFR_NATIONAL_AVG_PER_SF: Decimal = dec!(200);

const DEFAULT_TIER: &str = "SFR$";

/// Per-unit dollar rates for one pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierRates {
    pub per_tenant: Decimal,
    pub per_bed: Decimal,
    pub per_bath: Decimal,
    pub per_interior_sf: Decimal,
    pub per_solar: Decimal,
}

const TIER_TABLE: [(&str, TierRates); 3] = [
    (
        "SFR$",
        TierRates {
            per_tenant: dec!(21638),
            per_bed: dec!(257),
            per_bath: dec!(283),
            per_interior_sf: dec!(4),
            per_solar: dec!(15300),
        },
    ),
    (
        "SFR$$",
        TierRates {
            per_tenant: dec!(28565),
            per_bed: dec!(257),
            per_bath: dec!(283),
            per_interior_sf: dec!(11),
            per_solar: dec!(15300),
        },
    ),
    (
        "SFR$$$",
        TierRates {
            per_tenant: dec!(32691),
            per_bed: dec!(257),
            per_bath: dec!(283),
            per_interior_sf: dec!(11),
            per_solar: dec!(15300),
        },
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingType {
    #[serde(rename = "SFR")]
    SingleFamily,
    #[serde(rename = "MFR")]
    MultiFamily,
}

impl BuildingType {
    pub fn code(self) -> &'static str {
        match self {
            Self::SingleFamily => "SFR",
            Self::MultiFamily => "MFR",
        }
    }

    /// Long-form description used on estimator documents.
    pub fn building_use(self) -> &'static str {
        match self {
            Self::SingleFamily => "Single Family Residence",
            Self::MultiFamily => "Multi-Family Residence",
        }
    }
}

/// A tier code resolved to the rate table it prices with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierResolution {
    /// Tier as reported back to the caller.
    pub display: String,
    /// Single-family tier whose rates apply.
    pub rate_tier: &'static str,
    pub building_type: BuildingType,
    pub rates: TierRates,
    /// Replaces the caller's national average $/sf when set.
    pub national_avg_override: Option<Decimal>,
}

impl TierResolution {
    /// Resolves a tier code such as `SFR$$` or `mfr$$$`.
    ///
    /// `MFR` codes price with the same-suffix `SFR` rates and a fixed $200/sf
    /// national average. Unknown codes fall back to `SFR$`.
    pub fn resolve(code: &str) -> Self {
        let raw = code.trim().to_uppercase();

        if let Some(suffix) = raw.strip_prefix("MFR") {
            if let Some((rate_tier, rates)) = lookup_tier(&format!("SFR{suffix}")) {
                return Self {
                    display: raw.clone(),
                    rate_tier,
                    building_type: BuildingType::MultiFamily,
                    rates,
                    national_avg_override: Some(MFR_NATIONAL_AVG_PER_SF),
                };
            }
        }

        let (rate_tier, rates) = lookup_tier(&raw).unwrap_or_else(|| {
            warn!(tier = %code, fallback = DEFAULT_TIER, "unknown residential tier");
            (TIER_TABLE[0].0, TIER_TABLE[0].1)
        });

        Self {
            display: rate_tier.to_string(),
            rate_tier,
            building_type: BuildingType::SingleFamily,
            rates,
            national_avg_override: None,
        }
    }
}

fn lookup_tier(code: &str) -> Option<(&'static str, TierRates)> {
    TIER_TABLE.iter().find(|(name, _)| *name == code).copied()
}

/// Normalised residential request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidentialInput {
    pub tier: String,
    pub interior_sf: Decimal,
    pub site_acres: Decimal,
    pub bed_count: Decimal,
    pub bath_count: Decimal,
    pub tenant_count: Decimal,
    /// Share of interior area with flooring other than tile.
    pub flooring_fraction: Decimal,
    pub landscape_fraction: Decimal,
    pub hardscape_fraction: Decimal,
    pub parking_fraction: Decimal,
    pub solar_count: Decimal,
    /// Carried for display; pools do not enter the model.
    pub pool_count: Decimal,
    pub basis: Decimal,
    pub national_avg_per_sf: Decimal,
    pub in_service_date: Option<NaiveDate>,
    pub study_year: Option<i32>,
    pub property_address: Option<String>,
}

impl Default for ResidentialInput {
    fn default() -> Self {
        Self {
            tier: DEFAULT_TIER.to_string(),
            interior_sf: dec!(2000),
            site_acres: dec!(0.22),
            bed_count: dec!(3),
            bath_count: dec!(2),
            tenant_count: dec!(1),
            flooring_fraction: dec!(1.0),
            landscape_fraction: dec!(0.60),
            hardscape_fraction: dec!(0.10),
            parking_fraction: dec!(0),
            solar_count: dec!(0),
            pool_count: dec!(0),
            basis: dec!(300000),
            national_avg_per_sf: dec!(130),
            in_service_date: None,
            study_year: None,
            property_address: None,
        }
    }
}

impl ResidentialInput {
    /// Copy with every basis, area and count outside `[0, MAX_INPUT_AMOUNT]`
    /// zeroed. Fractions are clamped later, where they are used.
    fn bounded(&self) -> Self {
        Self {
            interior_sf: bounded_amount("interior sf", self.interior_sf),
            site_acres: bounded_amount("site acres", self.site_acres),
            bed_count: bounded_amount("bed count", self.bed_count),
            bath_count: bounded_amount("bath count", self.bath_count),
            tenant_count: bounded_amount("tenant count", self.tenant_count),
            solar_count: bounded_amount("solar count", self.solar_count),
            pool_count: bounded_amount("pool count", self.pool_count),
            basis: bounded_amount("basis", self.basis),
            national_avg_per_sf: bounded_amount("national avg $/sf", self.national_avg_per_sf),
            ..self.clone()
        }
    }
}

/// Site and interior measurements derived from the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteBreakdown {
    /// Interior sf × flooring fraction, rounded.
    pub adjusted_interior_sf: Decimal,
    pub site_area_sf: Decimal,
    pub landscape_sf: Decimal,
    pub hardscape_sf: Decimal,
    pub parking_sf: Decimal,
    pub landscape_acres: Decimal,
    pub hardscape_acres: Decimal,
    pub parking_acres: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiveYearItems {
    pub tenants: Decimal,
    pub beds: Decimal,
    pub baths: Decimal,
    pub interior: Decimal,
    pub solar: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FifteenYearItems {
    pub landscape: Decimal,
    pub hardscape: Decimal,
    pub parking: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildingValue {
    /// National average $/sf × interior sf.
    pub modeled_value: Decimal,
    /// The 5-year total, removed from the modeled value.
    pub personal_property: Decimal,
    /// Not clamped; negative when personal property outgrows the model.
    pub total: Decimal,
}

/// Basis split across the three residential buckets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidentialAllocation {
    pub modeled_total: Decimal,
    pub building_pct: Decimal,
    pub five_year_pct: Decimal,
    pub fifteen_year_pct: Decimal,
    pub accelerated_pct: Decimal,
    pub building: Decimal,
    pub five_year: Decimal,
    pub fifteen_year: Decimal,
    /// 5-year plus 15-year.
    pub accelerated: Decimal,
    /// Rounded basis minus the three allocations. Left unallocated.
    pub rounding_residual: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidentialResult {
    /// The request as modeled. Negative or oversized amounts are already
    /// zeroed here.
    pub input: ResidentialInput,
    pub tier: String,
    pub building_type: BuildingType,
    pub site: SiteBreakdown,
    pub five_year: FiveYearItems,
    pub fifteen_year: FifteenYearItems,
    pub building: BuildingValue,
    pub allocation: ResidentialAllocation,
    pub lookback: LookbackSummary,
}

/// Residential estimator bound to a schedule generator and a "current year"
/// used when a lookback has a date but no study year.
#[derive(Debug, Clone, Copy)]
pub struct ResidentialEstimator<'a> {
    schedule: DepreciationSchedule<'a>,
    current_year: i32,
}

impl Default for ResidentialEstimator<'static> {
    fn default() -> Self {
        Self::new(DepreciationSchedule::statutory(), Local::now().year())
    }
}

impl<'a> ResidentialEstimator<'a> {
    pub fn new(
        schedule: DepreciationSchedule<'a>,
        current_year: i32,
    ) -> Self {
        Self {
            schedule,
            current_year,
        }
    }

    pub fn with_current_year(
        mut self,
        current_year: i32,
    ) -> Self {
        self.current_year = current_year;
        self
    }

    /// Runs every section of the model and the optional lookback.
    pub fn calculate(
        &self,
        input: &ResidentialInput,
    ) -> ResidentialResult {
        let input = &input.bounded();
        let tier = TierResolution::resolve(&input.tier);
        let national_avg = tier.national_avg_override.unwrap_or(input.national_avg_per_sf);

        let site = self.site_breakdown(input);
        let five_year = self.five_year_items(input, &tier.rates, site.adjusted_interior_sf);
        let fifteen_year = self.fifteen_year_items(&site);

        let modeled_value = whole_dollars(national_avg * input.interior_sf);
        let building = BuildingValue {
            modeled_value,
            personal_property: five_year.total,
            total: modeled_value - five_year.total,
        };
        if building.total < Decimal::ZERO {
            warn!(
                building = %building.total,
                five_year = %five_year.total,
                "5-year property exceeds modeled building value"
            );
        }

        let allocation = self.allocate(input.basis, building.total, five_year.total, fifteen_year.total);
        let lookback = self.lookback(input, &allocation);

        ResidentialResult {
            input: input.clone(),
            tier: tier.display,
            building_type: tier.building_type,
            site,
            five_year,
            fifteen_year,
            building,
            allocation,
            lookback,
        }
    }

    fn site_breakdown(
        &self,
        input: &ResidentialInput,
    ) -> SiteBreakdown {
        let flooring = clamp_fraction(input.flooring_fraction);
        let adjusted_interior_sf = whole_dollars(input.interior_sf * flooring);

        let mut fractions = [
            clamp_fraction(input.landscape_fraction),
            clamp_fraction(input.hardscape_fraction),
            clamp_fraction(input.parking_fraction),
        ];
        let total: Decimal = fractions.iter().sum();
        if total > MAX_SITE_FRACTION {
            debug!(%total, cap = %MAX_SITE_FRACTION, "scaling site fractions to cap");
            let factor = MAX_SITE_FRACTION / total;
            for fraction in &mut fractions {
                *fraction *= factor;
            }
        }

        let site_area_sf = whole_dollars(input.site_acres * SQUARE_FEET_PER_ACRE);
        let [landscape, hardscape, parking] = fractions;

        SiteBreakdown {
            adjusted_interior_sf,
            site_area_sf,
            landscape_sf: whole_dollars(landscape * site_area_sf),
            hardscape_sf: whole_dollars(hardscape * site_area_sf),
            parking_sf: whole_dollars(parking * site_area_sf),
            landscape_acres: round_half_away(landscape * input.site_acres, 2),
            hardscape_acres: round_half_away(hardscape * input.site_acres, 2),
            parking_acres: round_half_away(parking * input.site_acres, 2),
        }
    }

    fn five_year_items(
        &self,
        input: &ResidentialInput,
        rates: &TierRates,
        adjusted_interior_sf: Decimal,
    ) -> FiveYearItems {
        let tenants = whole_dollars(rates.per_tenant * input.tenant_count);
        let beds = whole_dollars(rates.per_bed * input.bed_count);
        let baths = whole_dollars(rates.per_bath * input.bath_count);
        let interior = whole_dollars(rates.per_interior_sf * adjusted_interior_sf);
        let solar = whole_dollars(rates.per_solar * input.solar_count);

        FiveYearItems {
            tenants,
            beds,
            baths,
            interior,
            solar,
            total: tenants + beds + baths + interior + solar,
        }
    }

    fn fifteen_year_items(
        &self,
        site: &SiteBreakdown,
    ) -> FifteenYearItems {
        let landscape = whole_dollars(LANDSCAPE_RATE_PER_SF * site.landscape_sf);
        let hardscape = whole_dollars(HARDSCAPE_RATE_PER_SF * site.hardscape_sf);
        let parking = whole_dollars(PARKING_RATE_PER_SF * site.parking_sf);

        FifteenYearItems {
            landscape,
            hardscape,
            parking,
            total: landscape + hardscape + parking,
        }
    }

    fn allocate(
        &self,
        basis: Decimal,
        building: Decimal,
        five_year: Decimal,
        fifteen_year: Decimal,
    ) -> ResidentialAllocation {
        let modeled_total = building + five_year + fifteen_year;
        let (building_share, five_share, fifteen_share) = if modeled_total > Decimal::ZERO {
            (
                building / modeled_total,
                five_year / modeled_total,
                fifteen_year / modeled_total,
            )
        } else {
            debug!(%modeled_total, "non-positive modeled total, shares are zero");
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        };

        let building_amount = whole_dollars(building_share * basis);
        let five_amount = whole_dollars(five_share * basis);
        let fifteen_amount = whole_dollars(fifteen_share * basis);

        ResidentialAllocation {
            modeled_total,
            building_pct: percent(building_share),
            five_year_pct: percent(five_share),
            fifteen_year_pct: percent(fifteen_share),
            accelerated_pct: percent(five_share + fifteen_share),
            building: building_amount,
            five_year: five_amount,
            fifteen_year: fifteen_amount,
            accelerated: five_amount + fifteen_amount,
            rounding_residual: whole_dollars(basis) - building_amount - five_amount - fifteen_amount,
        }
    }

    /// Either a date or a study year activates the lookback; the other is
    /// defaulted.
    fn lookback(
        &self,
        input: &ResidentialInput,
        allocation: &ResidentialAllocation,
    ) -> LookbackSummary {
        let (in_service, study_year) = match (input.in_service_date, input.study_year) {
            (None, None) => return LookbackSummary::inactive(None, None),
            (Some(date), Some(year)) => (date, year),
            (None, Some(year)) => {
                let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) else {
                    warn!(study_year = year, "study year has no calendar date, lookback skipped");
                    return LookbackSummary::inactive(None, Some(year));
                };
                debug!(study_year = year, "in-service date defaulted to January 1 of study year");
                (date, year)
            }
            (Some(date), None) => {
                debug!(current_year = self.current_year, "study year defaulted to current year");
                (date, self.current_year)
            }
        };

        self.schedule.summarize(
            &[
                (AssetClass::ResidentialRental, allocation.building),
                (AssetClass::FiveYear, allocation.five_year),
                (AssetClass::FifteenYear, allocation.fifteen_year),
            ],
            in_service,
            study_year,
        )
    }
}

/// Runs the residential estimator with the statutory bonus schedule and
/// today's year.
pub fn compute_residential(input: &ResidentialInput) -> ResidentialResult {
    ResidentialEstimator::default().calculate(input)
}
