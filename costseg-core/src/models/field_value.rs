use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::calculations::common::clamp_fraction;

/// A single request value after scalar coercion.
///
/// Source systems send currency strings (`"$700,000"`), percentages
/// (`"60%"`), bare numbers and dates interchangeably. [`FieldValue::parse`]
/// normalises one raw string into this form; the typed accessors below turn it
/// into the numbers and dates the engine works with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Missing or whitespace-only.
    #[default]
    Blank,
    Number(Decimal),
    Date(NaiveDate),
    /// Anything that is not numeric, kept verbatim.
    Text(String),
}

impl FieldValue {
    /// Coerces a raw spreadsheet-style string.
    ///
    /// - blank → [`FieldValue::Blank`]
    /// - `"60%"` → `0.60`
    /// - `"$2,750,000"` → `2750000`
    /// - `"(1,234)"` → `-1234`
    /// - anything else → [`FieldValue::Text`] with the original input
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use costseg_core::FieldValue;
    ///
    /// assert_eq!(FieldValue::parse("60%"), FieldValue::Number(dec!(0.60)));
    /// assert_eq!(FieldValue::parse("$700,000"), FieldValue::Number(dec!(700000)));
    /// assert_eq!(FieldValue::parse("  "), FieldValue::Blank);
    /// assert_eq!(FieldValue::parse("Bank"), FieldValue::Text("Bank".to_string()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Blank;
        }

        if let Some(number) = trimmed.strip_suffix('%') {
            let cleaned = strip_decoration(number.trim());
            return match parse_plain_number(&cleaned) {
                Some(value) => Self::Number(value / Decimal::ONE_HUNDRED),
                None => Self::Text(raw.to_string()),
            };
        }

        let mut cleaned = strip_decoration(trimmed);
        if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() >= 2 {
            cleaned = format!("-{}", cleaned[1..cleaned.len() - 1].trim());
        }

        match parse_plain_number(&cleaned) {
            Some(value) => Self::Number(value),
            None => Self::Text(raw.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Numeric view of the value; numeric-looking text counts as a number.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => match Self::parse(text) {
                Self::Number(value) => Some(value),
                _ => None,
            },
            Self::Blank | Self::Date(_) => None,
        }
    }

    /// The value clamped into `[0, 1]`; non-numeric values yield zero.
    pub fn as_fraction(&self) -> Decimal {
        self.as_decimal().map(clamp_fraction).unwrap_or(Decimal::ZERO)
    }

    /// Integer year, truncating any fractional part (`"2,025"` → `2025`).
    pub fn as_year(&self) -> Option<i32> {
        self.as_decimal().and_then(|value| value.trunc().to_i32())
    }

    /// Text view of the value, `None` when blank.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Blank => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Blank => Ok(()),
            Self::Number(value) => write!(f, "{}", value.normalize()),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

fn strip_decoration(s: &str) -> String {
    s.chars().filter(|c| *c != ',' && *c != '$').collect()
}

/// Accepts `[-+]?digits(.digits)?` and nothing else.
fn parse_plain_number(s: &str) -> Option<Decimal> {
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };

    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || fraction.is_some_and(|f| !all_digits(f)) {
        return None;
    }

    s.strip_prefix('+').unwrap_or(s).parse().ok()
}
