//! Date coercion for request values.
//!
//! Dates arrive as native dates, as spreadsheet serial numbers, or as text in
//! one of a handful of layouts. Text layouts are tried in a fixed order and
//! the first that parses wins, so `03/04/2024` is always read as March 4th.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::warn;

use crate::models::FieldValue;

/// Text layouts in priority order.
pub const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y"];

/// Day zero of spreadsheet serial dates (1899-12-30).
pub fn spreadsheet_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(NaiveDate::MIN)
}

/// Converts a spreadsheet serial number to a date, truncating any time part.
pub fn date_from_serial(serial: Decimal) -> Option<NaiveDate> {
    let days = serial.trunc().to_i64()?;
    let epoch = spreadsheet_epoch();
    if days >= 0 {
        epoch.checked_add_days(Days::new(days as u64))
    } else {
        epoch.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

/// Parses a request value into a calendar date.
///
/// Returns `None` for blanks and for anything no layout accepts.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
/// use costseg_core::FieldValue;
/// use costseg_core::calculations::dates::parse_flexible_date;
///
/// let new_year = NaiveDate::from_ymd_opt(2021, 1, 1);
/// assert_eq!(parse_flexible_date(&FieldValue::Text("2021-01-01".into())), new_year);
/// assert_eq!(parse_flexible_date(&FieldValue::Number(dec!(44197))), new_year);
/// assert_eq!(parse_flexible_date(&FieldValue::Blank), None);
/// ```
pub fn parse_flexible_date(value: &FieldValue) -> Option<NaiveDate> {
    match value {
        FieldValue::Blank => None,
        FieldValue::Date(date) => Some(*date),
        FieldValue::Number(serial) => date_from_serial(*serial),
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            let parsed = DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok());
            if parsed.is_none() {
                warn!(input = %trimmed, "unrecognised date, treating as absent");
            }
            parsed
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn ymd(
        year: i32,
        month: u32,
        day: u32,
    ) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_flexible_date(&text("2018-06-15")), ymd(2018, 6, 15));
    }

    #[test]
    fn parses_us_slash_dates() {
        assert_eq!(parse_flexible_date(&text("06/15/2018")), ymd(2018, 6, 15));
    }

    #[test]
    fn parses_us_dash_dates() {
        assert_eq!(parse_flexible_date(&text("06-15-2018")), ymd(2018, 6, 15));
    }

    #[test]
    fn falls_back_to_day_first_when_month_is_impossible() {
        assert_eq!(parse_flexible_date(&text("25/12/2024")), ymd(2024, 12, 25));
    }

    #[test]
    fn ambiguous_slash_dates_are_read_month_first() {
        assert_eq!(parse_flexible_date(&text("03/04/2024")), ymd(2024, 3, 4));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(parse_flexible_date(&text("  2021-01-01 ")), ymd(2021, 1, 1));
    }

    #[test]
    fn converts_spreadsheet_serials() {
        assert_eq!(parse_flexible_date(&FieldValue::Number(dec!(1))), ymd(1899, 12, 31));
        assert_eq!(parse_flexible_date(&FieldValue::Number(dec!(44197))), ymd(2021, 1, 1));
    }

    #[test]
    fn serials_ignore_time_of_day() {
        assert_eq!(
            parse_flexible_date(&FieldValue::Number(dec!(44197.75))),
            ymd(2021, 1, 1)
        );
    }

    #[test]
    fn passes_native_dates_through() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();

        assert_eq!(parse_flexible_date(&FieldValue::Date(date)), Some(date));
    }

    #[test]
    fn unparseable_and_blank_values_are_none() {
        assert_eq!(parse_flexible_date(&text("sometime in 2021")), None);
        assert_eq!(parse_flexible_date(&text("   ")), None);
        assert_eq!(parse_flexible_date(&FieldValue::Blank), None);
    }

    #[test]
    fn epoch_is_the_spreadsheet_day_zero() {
        assert_eq!(Some(spreadsheet_epoch()), ymd(1899, 12, 30));
        assert_eq!(date_from_serial(dec!(0)), ymd(1899, 12, 30));
    }
}
