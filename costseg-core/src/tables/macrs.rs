//! MACRS recovery tables.
//!
//! Personal property (5/7/15-year) uses the half-year convention tables, one
//! rate per recovery year. Buildings use the mid-month tables, where the first
//! and last rows depend on the month the building was placed in service.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{AssetClass, Convention};

pub const FIVE_YEAR: [Decimal; 6] = [
    dec!(0.2000),
    dec!(0.3200),
    dec!(0.1920),
    dec!(0.1152),
    dec!(0.1152),
    dec!(0.0576),
];

pub const SEVEN_YEAR: [Decimal; 8] = [
    dec!(0.1429),
    dec!(0.2449),
    dec!(0.1749),
    dec!(0.1249),
    dec!(0.0893),
    dec!(0.0892),
    dec!(0.0893),
    dec!(0.0446),
];

pub const FIFTEEN_YEAR: [Decimal; 16] = [
    dec!(0.0500),
    dec!(0.0950),
    dec!(0.0855),
    dec!(0.0770),
    dec!(0.0693),
    dec!(0.0623),
    dec!(0.0590),
    dec!(0.0590),
    dec!(0.0591),
    dec!(0.0590),
    dec!(0.0591),
    dec!(0.0590),
    dec!(0.0591),
    dec!(0.0590),
    dec!(0.0591),
    dec!(0.0295),
];

/// Stub and flat rates for one mid-month table, by in-service month.
struct MidMonthTable {
    first_year: [Decimal; 12],
    /// Rows after the flat run, in order (one for 39-year, two for 27.5).
    closing_years: &'static [[Decimal; 12]],
    flat: Decimal,
    rows: u32,
}

const RESIDENTIAL_CLOSING: [[Decimal; 12]; 2] = [
    [
        dec!(0.01970),
        dec!(0.02273),
        dec!(0.02576),
        dec!(0.02879),
        dec!(0.03182),
        dec!(0.03485),
        dec!(0.03636),
        dec!(0.03636),
        dec!(0.03636),
        dec!(0.03636),
        dec!(0.03636),
        dec!(0.03636),
    ],
    [
        dec!(0),
        dec!(0),
        dec!(0),
        dec!(0),
        dec!(0),
        dec!(0),
        dec!(0.00152),
        dec!(0.00455),
        dec!(0.00758),
        dec!(0.01061),
        dec!(0.01364),
        dec!(0.01667),
    ],
];

const NONRESIDENTIAL_CLOSING: [[Decimal; 12]; 1] = [[
    dec!(0.00107),
    dec!(0.00321),
    dec!(0.00535),
    dec!(0.00749),
    dec!(0.00963),
    dec!(0.01177),
    dec!(0.01391),
    dec!(0.01605),
    dec!(0.01819),
    dec!(0.02033),
    dec!(0.02247),
    dec!(0.02461),
]];

const RESIDENTIAL_RENTAL: MidMonthTable = MidMonthTable {
    first_year: [
        dec!(0.03485),
        dec!(0.03182),
        dec!(0.02879),
        dec!(0.02576),
        dec!(0.02273),
        dec!(0.01970),
        dec!(0.01667),
        dec!(0.01364),
        dec!(0.01061),
        dec!(0.00758),
        dec!(0.00455),
        dec!(0.00152),
    ],
    closing_years: &RESIDENTIAL_CLOSING,
    flat: dec!(0.03636),
    rows: 29,
};

const NONRESIDENTIAL: MidMonthTable = MidMonthTable {
    first_year: [
        dec!(0.02461),
        dec!(0.02247),
        dec!(0.02033),
        dec!(0.01819),
        dec!(0.01605),
        dec!(0.01391),
        dec!(0.01177),
        dec!(0.00963),
        dec!(0.00749),
        dec!(0.00535),
        dec!(0.00321),
        dec!(0.00107),
    ],
    closing_years: &NONRESIDENTIAL_CLOSING,
    flat: dec!(0.02564),
    rows: 40,
};

impl MidMonthTable {
    fn rate(
        &self,
        year_index: u32,
        in_service_month: u32,
    ) -> Decimal {
        if year_index < 1 || year_index > self.rows {
            return Decimal::ZERO;
        }
        let column = (in_service_month.clamp(1, 12) - 1) as usize;
        let first_closing = self.rows - self.closing_years.len() as u32 + 1;

        if year_index == 1 {
            self.first_year[column]
        } else if year_index >= first_closing {
            self.closing_years[(year_index - first_closing) as usize][column]
        } else {
            self.flat
        }
    }
}

/// Half-year convention rate for a 5/7/15-year class. Zero for buildings and
/// for year indexes outside the table.
pub fn half_year_rate(
    class: AssetClass,
    year_index: u32,
) -> Decimal {
    let table: &[Decimal] = match class {
        AssetClass::FiveYear => &FIVE_YEAR,
        AssetClass::SevenYear => &SEVEN_YEAR,
        AssetClass::FifteenYear => &FIFTEEN_YEAR,
        AssetClass::ResidentialRental | AssetClass::Nonresidential => return Decimal::ZERO,
    };
    year_index
        .checked_sub(1)
        .and_then(|i| table.get(i as usize))
        .copied()
        .unwrap_or(Decimal::ZERO)
}

/// Mid-month convention rate for a building class. The month is clamped to
/// `1..=12`. Zero for personal property and year indexes outside the table.
pub fn mid_month_rate(
    class: AssetClass,
    year_index: u32,
    in_service_month: u32,
) -> Decimal {
    match class {
        AssetClass::ResidentialRental => RESIDENTIAL_RENTAL.rate(year_index, in_service_month),
        AssetClass::Nonresidential => NONRESIDENTIAL.rate(year_index, in_service_month),
        _ => Decimal::ZERO,
    }
}

/// Recovery rate for `class` in its `year_index`-th year (1-based).
pub fn recovery_rate(
    class: AssetClass,
    year_index: u32,
    in_service_month: u32,
) -> Decimal {
    match class.convention() {
        Convention::HalfYear => half_year_rate(class, year_index),
        Convention::MidMonth => mid_month_rate(class, year_index, in_service_month),
    }
}
