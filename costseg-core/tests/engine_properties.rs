//! Whole-engine properties checked over a spread of inputs.

use chrono::NaiveDate;
use costseg_core::calculations::whole_dollars;
use costseg_core::{
    AssetClass, CommercialEstimator, CommercialInput, DepreciationSchedule, GuidelineTable,
    ResidentialEstimator, ResidentialInput, compute_commercial, compute_lookback,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn ymd(
    year: i32,
    month: u32,
    day: u32,
) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn guidelines() -> GuidelineTable {
    GuidelineTable::new(
        ["Property Type", "39-yr", "15-yr", "7-yr", "5-yr"],
        [
            ["Bank", "0.72", "0.09", "0.03", "0.16"],
            ["Thirds", "0.3333", "0.3333", "0.3333", "0"],
            ["Percent Row", "61.5%", "12.25%", "7%", "19.25%"],
            ["All Building", "1", "0", "0", "0"],
        ],
    )
    .unwrap()
}

const BASES: [Decimal; 6] = [
    dec!(0),
    dec!(1),
    dec!(999.5),
    dec!(1000001),
    dec!(2750000),
    dec!(12345678.49),
];

// =============================================================================
// Basis conservation
// =============================================================================

#[test]
fn commercial_buckets_sum_to_rounded_basis() {
    let table = guidelines();
    for property_type in ["Bank", "Thirds", "Percent Row", "All Building"] {
        for basis in BASES {
            let input = CommercialInput {
                basis,
                property_type: property_type.to_string(),
                ..CommercialInput::default()
            };

            let result = compute_commercial(&input, &table);

            assert_eq!(
                result.allocation.total(),
                whole_dollars(basis),
                "{property_type} at {basis}"
            );
        }
    }
}

// =============================================================================
// Bonus exclusivity
// =============================================================================

#[test]
fn only_personal_property_takes_bonus() {
    let table = guidelines();
    for in_service in [ymd(2010, 10, 1), ymd(2016, 5, 1), ymd(2023, 7, 15), ymd(2026, 2, 1)] {
        let input = CommercialInput {
            basis: dec!(2750000),
            property_type: "Bank".to_string(),
            in_service_date: Some(in_service),
            study_year: Some(2026),
            ..CommercialInput::default()
        };
        let schedule = DepreciationSchedule::statutory();

        let result = CommercialEstimator::new(schedule).calculate(&input, &table);

        for entry in &result.lookback.schedules {
            let expected = if entry.class.is_building() {
                dec!(0)
            } else {
                let rate = schedule.bonus_rate(entry.class, in_service);
                whole_dollars(entry.schedule.original_basis * rate)
            };
            assert_eq!(entry.schedule.bonus_amount, expected, "{} on {in_service}", entry.class);
        }
    }
}

// =============================================================================
// Schedule boundedness
// =============================================================================

#[test]
fn lookback_rows_never_exceed_recovery_table() {
    for class in AssetClass::ALL {
        for month in [1, 6, 12] {
            let result = compute_lookback(dec!(500000), ymd(1990, month, 1), 2040, class);

            assert_eq!(result.rows.len() as u32, class.max_table_years(), "{class}");
        }
    }
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn repeated_calculations_are_identical() {
    let residential_input = ResidentialInput {
        in_service_date: Some(ymd(2022, 4, 1)),
        study_year: Some(2025),
        ..ResidentialInput::default()
    };
    let estimator = ResidentialEstimator::new(DepreciationSchedule::statutory(), 2025);
    assert_eq!(
        estimator.calculate(&residential_input),
        estimator.calculate(&residential_input)
    );

    let table = guidelines();
    let commercial_input = CommercialInput {
        in_service_date: Some(ymd(2019, 9, 30)),
        study_year: Some(2025),
        ..CommercialInput::default()
    };
    assert_eq!(
        compute_commercial(&commercial_input, &table),
        compute_commercial(&commercial_input, &table)
    );
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn residential_scenario_has_five_years_in_service() {
    let input = ResidentialInput {
        tier: "SFR$$".to_string(),
        interior_sf: dec!(1620),
        basis: dec!(700000),
        in_service_date: Some(ymd(2021, 1, 1)),
        study_year: Some(2025),
        ..ResidentialInput::default()
    };

    let result =
        ResidentialEstimator::new(DepreciationSchedule::statutory(), 2026).calculate(&input);

    assert_eq!(result.lookback.years_in_service, 5);
    assert!(result.lookback.total_current_year_depreciation > dec!(0));
}

#[test]
fn unmatched_property_type_allocates_nothing() {
    let input = CommercialInput {
        property_type: "Medical Center".to_string(),
        ..CommercialInput::default()
    };

    let result = compute_commercial(&input, &guidelines());

    assert!(result.lookup_failed);
    for (_, amount) in result.allocation.buckets() {
        assert_eq!(amount, dec!(0));
    }
}

#[test]
fn zero_basis_lookback_is_empty() {
    for (in_service, study_year) in [(ymd(2020, 1, 1), 2025), (ymd(2025, 6, 1), 2020)] {
        for class in AssetClass::ALL {
            let result = compute_lookback(dec!(0), in_service, study_year, class);

            assert!(result.rows.is_empty());
            assert_eq!(result.bonus_amount, dec!(0));
            assert_eq!(result.current_year_depreciation, dec!(0));
            assert_eq!(result.cumulative_depreciation, dec!(0));
            assert_eq!(result.net_book_value, dec!(0));
        }
    }
}
