//! Rendering of estimates for stdout.
use std::collections::BTreeMap;

use clap::ValueEnum;
use costseg_core::calculations::whole_dollars;
use costseg_core::{
    CommercialResult, EstimatorPayload, LookbackResult, LookbackSummary, ResidentialResult,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// The full calculation result.
    #[default]
    Json,
    /// Human-readable tables.
    Table,
    /// The `{summary, yearly}` projection consumed by document templates.
    Payload,
}

pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

// ─── row types ───────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Share %")]
    share: String,
    #[tabled(rename = "Allocation")]
    amount: String,
}

#[derive(Tabled)]
struct LookbackClassRow {
    #[tabled(rename = "Class")]
    class: String,
    #[tabled(rename = "Bonus Rate")]
    bonus_rate: String,
    #[tabled(rename = "Bonus")]
    bonus: String,
    #[tabled(rename = "Depreciable Basis")]
    depreciable_basis: String,
    #[tabled(rename = "Current Year")]
    current_year: String,
    #[tabled(rename = "Cumulative")]
    cumulative: String,
    #[tabled(rename = "Net Book Value")]
    net_book_value: String,
}

#[derive(Tabled)]
struct ScheduleRow {
    #[tabled(rename = "Year")]
    year: i32,
    #[tabled(rename = "Table Year")]
    table_year: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Depreciation")]
    depreciation: String,
    #[tabled(rename = "Cumulative")]
    cumulative: String,
}

fn styled(table: &mut Table) -> String {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()));
    table.to_string()
}

fn amount(value: Decimal) -> String {
    whole_dollars(value).normalize().to_string()
}

fn pct(value: Decimal) -> String {
    format!("{}%", value.normalize())
}

fn field_table(rows: Vec<FieldRow>) -> String {
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

// ─── lookback ────────────────────────────────────────────────────────────────

fn lookback_table(lookback: &LookbackSummary) -> String {
    if !lookback.active {
        return "Lookback: inactive (in-service date or study year missing)".to_string();
    }

    let mut rows: Vec<LookbackClassRow> = lookback
        .schedules
        .iter()
        .map(|entry| LookbackClassRow {
            class: entry.class.to_string(),
            bonus_rate: pct(entry.schedule.bonus_rate * Decimal::ONE_HUNDRED),
            bonus: amount(entry.schedule.bonus_amount),
            depreciable_basis: amount(entry.schedule.depreciable_basis),
            current_year: amount(entry.schedule.current_year_depreciation),
            cumulative: amount(entry.schedule.cumulative_depreciation),
            net_book_value: amount(entry.schedule.net_book_value),
        })
        .collect();
    rows.push(LookbackClassRow {
        class: "Total".to_string(),
        bonus_rate: String::new(),
        bonus: String::new(),
        depreciable_basis: String::new(),
        current_year: amount(lookback.total_current_year_depreciation),
        cumulative: amount(lookback.total_cumulative_depreciation),
        net_book_value: String::new(),
    });

    let heading = format!(
        "Lookback {} to {} ({} years in service, prior years {})",
        lookback
            .in_service_date
            .map(|date| date.to_string())
            .unwrap_or_default(),
        lookback.study_year.unwrap_or_default(),
        lookback.years_in_service,
        amount(lookback.prior_years_depreciation),
    );

    format!("{heading}\n{}", styled(&mut Table::new(rows)))
}

// ─── estimates ───────────────────────────────────────────────────────────────

pub fn residential_table(result: &ResidentialResult) -> String {
    let allocation = &result.allocation;

    let header = field_table(vec![
        FieldRow {
            field: "Tier",
            value: result.tier.clone(),
        },
        FieldRow {
            field: "Building Use",
            value: result.building_type.building_use().to_string(),
        },
        FieldRow {
            field: "Basis",
            value: amount(result.input.basis),
        },
        FieldRow {
            field: "Modeled Total",
            value: amount(allocation.modeled_total),
        },
        FieldRow {
            field: "Rounding Residual",
            value: amount(allocation.rounding_residual),
        },
    ]);

    let buckets = vec![
        BucketRow {
            class: "27.5-year".to_string(),
            share: pct(allocation.building_pct),
            amount: amount(allocation.building),
        },
        BucketRow {
            class: "5-year".to_string(),
            share: pct(allocation.five_year_pct),
            amount: amount(allocation.five_year),
        },
        BucketRow {
            class: "15-year".to_string(),
            share: pct(allocation.fifteen_year_pct),
            amount: amount(allocation.fifteen_year),
        },
        BucketRow {
            class: "Accelerated".to_string(),
            share: pct(allocation.accelerated_pct),
            amount: amount(allocation.accelerated),
        },
    ];

    format!(
        "{header}\n{}\n{}",
        styled(&mut Table::new(buckets)),
        lookback_table(&result.lookback)
    )
}

pub fn commercial_table(result: &CommercialResult) -> String {
    if result.lookup_failed {
        return format!(
            "Property type '{}' not found in the guideline table; nothing allocated.",
            result.input.property_type
        );
    }

    let allocation = &result.allocation;

    let header = field_table(vec![
        FieldRow {
            field: "Property Type",
            value: result.matched_property_type.clone().unwrap_or_default(),
        },
        FieldRow {
            field: "Dep. Life",
            value: result.dep_life.clone().unwrap_or_default(),
        },
        FieldRow {
            field: "Basis",
            value: amount(result.input.basis),
        },
        FieldRow {
            field: "Rounding Adjustment",
            value: amount(allocation.rounding_adjustment),
        },
    ]);

    let buckets = vec![
        BucketRow {
            class: "39-year".to_string(),
            share: pct(allocation.nonresidential_pct),
            amount: amount(allocation.nonresidential),
        },
        BucketRow {
            class: "15-year".to_string(),
            share: pct(allocation.fifteen_year_pct),
            amount: amount(allocation.fifteen_year),
        },
        BucketRow {
            class: "7-year".to_string(),
            share: pct(allocation.seven_year_pct),
            amount: amount(allocation.seven_year),
        },
        BucketRow {
            class: "5-year".to_string(),
            share: pct(allocation.five_year_pct),
            amount: amount(allocation.five_year),
        },
        BucketRow {
            class: "Accelerated".to_string(),
            share: pct(allocation.accelerated_pct),
            amount: amount(allocation.accelerated()),
        },
    ];

    format!(
        "{header}\n{}\n{}",
        styled(&mut Table::new(buckets)),
        lookback_table(&result.lookback)
    )
}

/// Projection rendered as the summary block plus the year grid.
pub fn payload_table(payload: &EstimatorPayload) -> String {
    let summary = &payload.summary;
    let header = field_table(vec![
        FieldRow {
            field: "Property Address",
            value: summary.property_address.clone(),
        },
        FieldRow {
            field: "Building Use",
            value: summary.building_use.clone(),
        },
        FieldRow {
            field: "Basis for Cost Segregation",
            value: amount(summary.basis_for_cost_segregation),
        },
        FieldRow {
            field: "Total Accelerated",
            value: amount(summary.total_accelerated),
        },
        FieldRow {
            field: "Estimated Additional Depreciation",
            value: amount(summary.estimated_additional_depreciation),
        },
    ]);

    let mut builder = tabled::builder::Builder::default();
    builder.push_record(["Year", "5yr", "7yr", "15yr", "long", "with_css", "without_css"]);
    for (year, amounts) in &payload.yearly {
        let mut record = vec![year.to_string()];
        record.extend(
            ["5yr", "7yr", "15yr", "long", "with_css", "without_css"]
                .iter()
                .map(|key| amounts.get(key).map(amount).unwrap_or_default()),
        );
        builder.push_record(record);
    }

    format!("{header}\n{}", styled(&mut builder.build()))
}

// ─── schedules ───────────────────────────────────────────────────────────────

pub fn lookback_schedule_table(result: &LookbackResult) -> String {
    let rows: Vec<ScheduleRow> = result
        .rows
        .iter()
        .map(|row| ScheduleRow {
            year: row.calendar_year,
            table_year: row.table_year.to_string(),
            rate: row.rate.normalize().to_string(),
            depreciation: amount(row.depreciation),
            cumulative: amount(row.cumulative),
        })
        .collect();

    let header = field_table(vec![
        FieldRow {
            field: "Basis",
            value: amount(result.original_basis),
        },
        FieldRow {
            field: "Bonus",
            value: amount(result.bonus_amount),
        },
        FieldRow {
            field: "Net Book Value",
            value: amount(result.net_book_value),
        },
    ]);

    format!("{header}\n{}", styled(&mut Table::new(rows)))
}

pub fn full_schedule_table(schedule: &BTreeMap<i32, Decimal>) -> String {
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(["Year", "Depreciation"]);
    for (year, value) in schedule {
        builder.push_record([year.to_string(), amount(*value)]);
    }
    builder.push_record([
        "Total".to_string(),
        amount(schedule.values().copied().sum()),
    ]);
    styled(&mut builder.build())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use costseg_core::{
        AssetClass, CommercialInput, DepreciationSchedule, GuidelineTable, ResidentialEstimator,
        ResidentialInput, compute_commercial, compute_full_schedule, compute_lookback,
    };
    use rust_decimal_macros::dec;

    use super::*;

    fn ymd(
        year: i32,
        month: u32,
        day: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn residential() -> ResidentialResult {
        ResidentialEstimator::new(DepreciationSchedule::statutory(), 2026).calculate(
            &ResidentialInput {
                tier: "SFR$$".to_string(),
                interior_sf: dec!(1620),
                basis: dec!(700000),
                in_service_date: Some(ymd(2021, 1, 1)),
                study_year: Some(2025),
                ..ResidentialInput::default()
            },
        )
    }

    // =========================================================================
    // Estimates
    // =========================================================================

    #[test]
    fn residential_table_lists_buckets_and_lookback() {
        let text = residential_table(&residential());

        assert!(text.contains("SFR$$"), "{text}");
        assert!(text.contains("486651"), "{text}");
        assert!(text.contains("30.48%"), "{text}");
        assert!(text.contains("Lookback 2021-01-01 to 2025"), "{text}");
        assert!(text.contains("17695"), "{text}");
    }

    #[test]
    fn residential_without_dates_reports_inactive_lookback() {
        let result = ResidentialEstimator::new(DepreciationSchedule::statutory(), 2026)
            .calculate(&ResidentialInput::default());

        assert!(residential_table(&result).contains("Lookback: inactive"));
    }

    #[test]
    fn failed_commercial_lookup_is_reported_plainly() {
        let table = GuidelineTable::new(["Property Type", "39-yr"], [["Bank", "1"]]).unwrap();
        let input = CommercialInput {
            property_type: "Hotel".to_string(),
            ..CommercialInput::default()
        };

        let text = commercial_table(&compute_commercial(&input, &table));

        assert!(text.contains("'Hotel' not found"), "{text}");
    }

    #[test]
    fn payload_table_has_a_row_per_year() {
        let payload = EstimatorPayload::from_residential(&residential(), dec!(0.40));
        let text = payload_table(&payload);

        for year in 2021..=2025 {
            assert!(text.contains(&year.to_string()), "{text}");
        }
        assert!(text.contains("with_css"), "{text}");
    }

    // =========================================================================
    // Schedules
    // =========================================================================

    #[test]
    fn full_schedule_table_totals_the_basis() {
        let schedule = compute_full_schedule(dec!(100000), ymd(2030, 3, 1), AssetClass::FiveYear);

        let text = full_schedule_table(&schedule);

        assert!(text.contains("Total"), "{text}");
        assert!(text.contains("100000"), "{text}");
    }

    #[test]
    fn lookback_schedule_table_shows_each_year() {
        let result = compute_lookback(dec!(100000), ymd(2030, 3, 1), 2032, AssetClass::FiveYear);

        let text = lookback_schedule_table(&result);

        assert!(text.contains("2030"), "{text}");
        assert!(text.contains("2032"), "{text}");
    }

    #[test]
    fn json_output_is_pretty_printed() {
        let text = to_json(&residential().allocation).unwrap();

        assert!(text.contains("\n  \"building\": \"486651\""), "{text}");
    }
}
