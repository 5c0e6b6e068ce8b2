//! Commercial guideline table.
//!
//! Each row maps a property type to the fraction of basis that falls into the
//! 39/15/7/5-year classes. Header spellings differ between source files, so
//! columns are addressed by a list of accepted names, compared trimmed and
//! case-insensitively.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use super::FieldValue;
use crate::calculations::common::clamp_fraction;

/// Accepted spellings of the property-type column.
pub const PROPERTY_TYPE_HEADERS: [&str; 2] = ["property type", "property type guideline"];

/// Accepted spellings of the optional depreciation-life column.
pub const DEP_LIFE_HEADERS: [&str; 4] = ["dep. life", "dep life", "dep. life (yrs)", "dep. life (years)"];

pub const NONRESIDENTIAL_HEADERS: [&str; 3] = ["39-yr", "39 yr", "39"];
pub const FIFTEEN_YEAR_HEADERS: [&str; 3] = ["15-yr", "15 yr", "15"];
pub const SEVEN_YEAR_HEADERS: [&str; 3] = ["7-yr", "7 yr", "7"];
pub const FIVE_YEAR_HEADERS: [&str; 3] = ["5-yr", "5 yr", "5"];
pub const TOTAL_ACCELERATED_HEADERS: [&str; 2] = ["total accelerated", "total accelerated %"];

/// Errors raised when a guideline table cannot be used at all.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuidelineTableError {
    /// No column is headed `Property Type` or `Property Type Guideline`.
    #[error("guideline table has no Property Type column (headers: {0:?})")]
    MissingPropertyTypeColumn(Vec<String>),
}

/// One guideline row with its cells already coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidelineRow {
    property_type: String,
    cells: Vec<(String, FieldValue)>,
}

impl GuidelineRow {
    /// Property type as written in the table.
    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    /// Value of the first column whose header matches one of `names`.
    ///
    /// Names are tried in order, so earlier spellings take precedence over
    /// later ones regardless of column order.
    pub fn value(
        &self,
        names: &[&str],
    ) -> Option<&FieldValue> {
        names.iter().find_map(|name| {
            self.cells
                .iter()
                .find(|(header, _)| header == name)
                .map(|(_, value)| value)
        })
    }

    /// Fraction stored under one of `names`, clamped into `[0, 1]`.
    ///
    /// A missing column or blank cell yields `default`; a cell that is present
    /// but not numeric yields zero.
    pub fn fraction(
        &self,
        names: &[&str],
        default: Decimal,
    ) -> Decimal {
        match self.value(names) {
            None | Some(FieldValue::Blank) => clamp_fraction(default),
            Some(value) => value.as_fraction(),
        }
    }

    /// Depreciation-life label, when the table carries one.
    pub fn dep_life(&self) -> Option<String> {
        self.value(&DEP_LIFE_HEADERS).and_then(FieldValue::as_text)
    }
}

/// Result of looking a property type up in a [`GuidelineTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidelineMatch<'a> {
    Exact(&'a GuidelineRow),
    Contains(&'a GuidelineRow),
}

impl<'a> GuidelineMatch<'a> {
    pub fn row(self) -> &'a GuidelineRow {
        match self {
            Self::Exact(row) | Self::Contains(row) => row,
        }
    }
}

/// A validated guideline table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuidelineTable {
    headers: Vec<String>,
    rows: Vec<GuidelineRow>,
}

impl GuidelineTable {
    /// Builds a table from raw headers and raw cell text.
    ///
    /// Headers are trimmed. Rows shorter than the header list are padded
    /// with blanks; extra cells are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GuidelineTableError::MissingPropertyTypeColumn`] when no
    /// header names the property-type column.
    pub fn new<H, R, C>(
        headers: H,
        rows: R,
    ) -> Result<Self, GuidelineTableError>
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .collect();
        let keys: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();

        let type_column = keys
            .iter()
            .position(|k| PROPERTY_TYPE_HEADERS.contains(&k.as_str()))
            .ok_or_else(|| GuidelineTableError::MissingPropertyTypeColumn(headers.clone()))?;

        let rows = rows
            .into_iter()
            .map(|raw| {
                let mut values: Vec<String> = raw
                    .into_iter()
                    .map(|cell| cell.as_ref().trim().to_string())
                    .collect();
                values.resize(keys.len(), String::new());

                GuidelineRow {
                    property_type: values[type_column].clone(),
                    cells: keys
                        .iter()
                        .cloned()
                        .zip(values.iter().map(|v| FieldValue::parse(v)))
                        .collect(),
                }
            })
            .collect();

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[GuidelineRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds the row for `property_type`.
    ///
    /// The whole table is searched for a case-insensitive exact match first;
    /// only then is the first row whose property type contains the query
    /// accepted. A blank query never matches.
    pub fn find(
        &self,
        property_type: &str,
    ) -> Option<GuidelineMatch<'_>> {
        let query = property_type.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        if let Some(row) = self
            .rows
            .iter()
            .find(|row| row.property_type.to_lowercase() == query)
        {
            return Some(GuidelineMatch::Exact(row));
        }

        self.rows
            .iter()
            .find(|row| row.property_type.to_lowercase().contains(&query))
            .map(GuidelineMatch::Contains)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn sample_table() -> GuidelineTable {
        GuidelineTable::new(
            ["Property Type", "39-yr", "15-yr", "7-yr", "5-yr", "Dep. Life"],
            [
                ["Bank Branch", "0.70", "0.10", "0.05", "0.15", "39"],
                ["Bank", "0.72", "0.09", "0.03", "0.16", "39"],
                ["Restaurant", "65%", "20%", "", "15%", ""],
            ],
        )
        .unwrap()
    }

    // =========================================================================
    // construction tests
    // =========================================================================

    #[test]
    fn new_requires_property_type_column() {
        let result = GuidelineTable::new(["Type", "39-yr"], [["Bank", "1"]]);

        assert_eq!(
            result,
            Err(GuidelineTableError::MissingPropertyTypeColumn(vec![
                "Type".to_string(),
                "39-yr".to_string()
            ]))
        );
    }

    #[test]
    fn new_accepts_guideline_header_spelling() {
        let table = GuidelineTable::new([" Property Type Guideline "], [["Office"]]).unwrap();

        assert_eq!(table.headers(), &["Property Type Guideline".to_string()]);
        assert_eq!(table.rows()[0].property_type(), "Office");
    }

    #[test]
    fn new_pads_short_rows() {
        let table = GuidelineTable::new(["Property Type", "39-yr"], [vec!["Office"]]).unwrap();

        assert_eq!(table.rows()[0].value(&NONRESIDENTIAL_HEADERS), Some(&FieldValue::Blank));
    }

    // =========================================================================
    // find tests
    // =========================================================================

    #[test]
    fn find_prefers_exact_match_anywhere_in_table() {
        let table = sample_table();

        let found = table.find("bank").unwrap();

        assert!(matches!(found, GuidelineMatch::Exact(_)));
        assert_eq!(found.row().property_type(), "Bank");
    }

    #[test]
    fn find_falls_back_to_first_containing_row() {
        let table = sample_table();

        let found = table.find("BRANCH").unwrap();

        assert!(matches!(found, GuidelineMatch::Contains(_)));
        assert_eq!(found.row().property_type(), "Bank Branch");
    }

    #[test]
    fn find_rejects_blank_and_unknown_queries() {
        let table = sample_table();

        assert!(table.find("   ").is_none());
        assert!(table.find("Medical Center").is_none());
    }

    // =========================================================================
    // fraction tests
    // =========================================================================

    #[test]
    fn fraction_reads_first_matching_header() {
        let table = sample_table();
        let row = table.find("Bank").unwrap().row();

        assert_eq!(row.fraction(&NONRESIDENTIAL_HEADERS, dec!(0)), dec!(0.72));
        assert_eq!(row.fraction(&FIVE_YEAR_HEADERS, dec!(0)), dec!(0.16));
    }

    #[test]
    fn fraction_accepts_percent_cells() {
        let table = sample_table();
        let row = table.find("Restaurant").unwrap().row();

        assert_eq!(row.fraction(&NONRESIDENTIAL_HEADERS, dec!(0)), dec!(0.65));
    }

    #[test]
    fn fraction_uses_default_for_missing_or_blank_cells() {
        let table = sample_table();
        let row = table.find("Restaurant").unwrap().row();

        assert_eq!(row.fraction(&SEVEN_YEAR_HEADERS, dec!(0)), dec!(0));
        assert_eq!(row.fraction(&TOTAL_ACCELERATED_HEADERS, dec!(0.35)), dec!(0.35));
    }

    #[test]
    fn fraction_clamps_out_of_range_values() {
        let table = GuidelineTable::new(
            ["Property Type", "39 yr", "15 yr"],
            [["Warehouse", "1.5", "-0.2"]],
        )
        .unwrap();
        let row = &table.rows()[0];

        assert_eq!(row.fraction(&NONRESIDENTIAL_HEADERS, dec!(0)), dec!(1));
        assert_eq!(row.fraction(&FIFTEEN_YEAR_HEADERS, dec!(0)), dec!(0));
    }

    #[test]
    fn fraction_of_text_cell_is_zero() {
        let table =
            GuidelineTable::new(["Property Type", "5-yr"], [["Hotel", "varies"]]).unwrap();

        assert_eq!(table.rows()[0].fraction(&FIVE_YEAR_HEADERS, dec!(0.5)), dec!(0));
    }

    #[test]
    fn dep_life_is_echoed_when_present() {
        let table = sample_table();

        assert_eq!(table.find("Bank").unwrap().row().dep_life(), Some("39".to_string()));
        assert_eq!(table.find("Restaurant").unwrap().row().dep_life(), None);
    }
}
