//! Request loading: JSON and legacy text requests, keyed by spreadsheet cell.
//!
//! Requests may address the model by cell (`"B12": 700000`) or by field name
//! (`"Basis": 700000`). Field names are matched case-insensitively with
//! whitespace collapsed, then mapped to the cell the legacy workbooks used.
//! Unknown fields are kept verbatim so that pass-through values such as
//! `Property Address` survive the trip to the projection summary.
//!
//! Supported JSON shapes (all equivalent):
//!
//! ```json
//! { "B31": "SFR$$", "B1": 1620, "B12": "700,000" }
//! { "Tier": "SFR$$", "Interior SF": 1620, "Basis": "$700,000" }
//! { "inputs": { "Tier": "SFR$$" } }
//! { "cells": { "B31": "SFR$$" } }
//! ```
//!
//! The legacy text format is one `<Field> <Cell>, <Value>` or
//! `<Field>, <Value>` entry per line. Residential files may open with the
//! tier on a line of its own:
//!
//! ```text
//! SFR$$
//! Interior SF B1, 1620
//! Basis B12, 700,000
//! Study Tax Year, 2025
//! ```
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use costseg_core::calculations::dates::parse_flexible_date;
use costseg_core::{CommercialInput, FieldValue, ResidentialInput};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Cell addresses
// ---------------------------------------------------------------------------

const RES_INTERIOR_SF: &str = "B1";
const RES_SITE_ACRES: &str = "B2";
const RES_BED_COUNT: &str = "B3";
const RES_BATH_COUNT: &str = "B4";
const RES_TENANT_COUNT: &str = "B5";
const RES_FLOORING: &str = "B6";
const RES_LANDSCAPE: &str = "B7";
const RES_HARDSCAPE: &str = "B8";
const RES_PARKING: &str = "B9";
const RES_SOLAR_COUNT: &str = "B10";
const RES_POOL_COUNT: &str = "B11";
const RES_BASIS: &str = "B12";
const RES_NATIONAL_AVG: &str = "B28";
const RES_TIER: &str = "B31";

const COM_BASIS: &str = "B1";
const COM_PROPERTY_TYPE: &str = "B2";

const IN_SERVICE_DATE: &str = "B32";
const STUDY_YEAR: &str = "B34";

const RESIDENTIAL_FIELDS: [(&str, &str); 20] = [
    ("tier", RES_TIER),
    ("property tier", RES_TIER),
    ("interior sf", RES_INTERIOR_SF),
    ("site acres", RES_SITE_ACRES),
    ("bed cnt", RES_BED_COUNT),
    ("bath cnt", RES_BATH_COUNT),
    ("tenant cnt", RES_TENANT_COUNT),
    ("flooring (sans tile) %", RES_FLOORING),
    ("flooring (sans tile)", RES_FLOORING),
    ("landscape %", RES_LANDSCAPE),
    ("hardscape %", RES_HARDSCAPE),
    ("parking lot %", RES_PARKING),
    ("solar cnt", RES_SOLAR_COUNT),
    ("pool cnt", RES_POOL_COUNT),
    ("basis", RES_BASIS),
    ("national avg $/sf (res.)", RES_NATIONAL_AVG),
    ("national avg $/sf (res)", RES_NATIONAL_AVG),
    ("date placed in service", IN_SERVICE_DATE),
    ("in-service date", IN_SERVICE_DATE),
    ("study tax year", STUDY_YEAR),
];

const COMMERCIAL_FIELDS: [(&str, &str); 6] = [
    ("basis", COM_BASIS),
    ("property type", COM_PROPERTY_TYPE),
    ("in-service date", IN_SERVICE_DATE),
    ("in service date", IN_SERVICE_DATE),
    ("date placed in service", IN_SERVICE_DATE),
    ("study tax year", STUDY_YEAR),
];

const ADDRESS_KEYS: [&str; 2] = ["property address", "property_address"];

static CELL_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{1,3}\d{1,5}$").expect("cell key pattern is valid")
});

static LEGACY_CELL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\s+([A-Z]{1,3}\d{1,5})\s*,\s*(.*)$").expect("legacy line pattern is valid")
});

/// Collapses runs of whitespace, trims and lowercases a field name.
fn normalize_key(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which allocator a request is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateMode {
    Residential,
    Commercial,
}

/// Returned when a mode name is neither `residential` nor `commercial`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown estimate mode '{0}' (expected 'residential' or 'commercial')")]
pub struct UnknownModeError(pub String);

impl EstimateMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Commercial => "commercial",
        }
    }

    fn field_map(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Residential => &RESIDENTIAL_FIELDS,
            Self::Commercial => &COMMERCIAL_FIELDS,
        }
    }

    /// Cell addressed by a human-readable field name, if the mode knows it.
    ///
    /// ```
    /// use costseg_data::EstimateMode;
    ///
    /// assert_eq!(EstimateMode::Residential.cell_for_field("  Interior   SF "), Some("B1"));
    /// assert_eq!(EstimateMode::Commercial.cell_for_field("Basis"), Some("B1"));
    /// assert_eq!(EstimateMode::Commercial.cell_for_field("Tier"), None);
    /// ```
    pub fn cell_for_field(
        self,
        field: &str,
    ) -> Option<&'static str> {
        let key = normalize_key(field);
        self.field_map()
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, cell)| *cell)
    }
}

impl FromStr for EstimateMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "residential" => Ok(Self::Residential),
            "commercial" => Ok(Self::Commercial),
            _ => Err(UnknownModeError(s.to_string())),
        }
    }
}

impl fmt::Display for EstimateMode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while reading a request file.
#[derive(Debug, Error)]
pub enum RequestLoadError {
    #[error("failed to read request file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON request: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON document is valid but its top level is not an object.
    #[error("JSON request must be an object, optionally wrapped in 'inputs' or 'cells'")]
    NotAnObject,

    #[error("unsupported request format '{0}': use .json or .txt")]
    UnsupportedFormat(String),
}

// ---------------------------------------------------------------------------
// Request fields
// ---------------------------------------------------------------------------

/// A request after key mapping and scalar coercion.
///
/// Keys are cell addresses where the field is known to the mode, and the
/// trimmed original key otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestFields {
    mode: EstimateMode,
    values: BTreeMap<String, FieldValue>,
}

impl RequestFields {
    /// An empty request; converting it yields the calculator defaults.
    pub fn new(mode: EstimateMode) -> Self {
        Self {
            mode,
            values: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> EstimateMode {
        self.mode
    }

    pub fn values(&self) -> &BTreeMap<String, FieldValue> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stores `value` under the cell `key` resolves to, replacing any
    /// previous value.
    pub fn insert(
        &mut self,
        key: &str,
        value: FieldValue,
    ) {
        let key = self.resolve_key(key);
        self.values.insert(key, value);
    }

    /// Looks a value up by cell address or by field name.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&FieldValue> {
        self.values.get(&self.resolve_key(key))
    }

    fn resolve_key(
        &self,
        key: &str,
    ) -> String {
        let key = key.trim();
        if CELL_KEY.is_match(key) {
            return key.to_string();
        }
        match self.mode.cell_for_field(key) {
            Some(cell) => cell.to_string(),
            None => key.to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Loaders
    // -----------------------------------------------------------------------

    /// Builds a request from a parsed JSON document.
    ///
    /// # Errors
    ///
    /// [`RequestLoadError::NotAnObject`] when the top level is not an object.
    pub fn from_json_value(
        mode: EstimateMode,
        value: &Value,
    ) -> Result<Self, RequestLoadError> {
        let root = value.as_object().ok_or(RequestLoadError::NotAnObject)?;
        let payload: &Map<String, Value> = ["inputs", "cells"]
            .iter()
            .find_map(|wrapper| root.get(*wrapper).and_then(Value::as_object))
            .unwrap_or(root);

        let mut fields = Self::new(mode);
        for (key, value) in payload {
            fields.insert(key, json_to_field(value));
        }
        debug!(mode = %mode, fields = fields.len(), "loaded JSON request");
        Ok(fields)
    }

    pub fn from_json_str(
        mode: EstimateMode,
        text: &str,
    ) -> Result<Self, RequestLoadError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(mode, &value)
    }

    /// Parses the legacy line-oriented text format.
    ///
    /// Lines without a comma are ignored. For `<Field>, <Value>` lines the
    /// split happens at the first comma, so values may carry thousands
    /// separators.
    pub fn from_legacy_text(
        mode: EstimateMode,
        text: &str,
    ) -> Self {
        let mut fields = Self::new(mode);
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .peekable();

        if mode == EstimateMode::Residential {
            if let Some(first) = lines.next_if(|line| !line.contains(',') && !line.contains('B')) {
                fields.values.insert(RES_TIER.to_string(), FieldValue::parse(first));
            }
        }

        for line in lines {
            if let Some(caps) = LEGACY_CELL_LINE.captures(line) {
                let field = caps[1].trim();
                let cell = caps[2].to_string();
                let value = FieldValue::parse(&caps[3]);

                fields.values.insert(cell.clone(), value.clone());
                if let Some(mapped) = mode.cell_for_field(field) {
                    fields.values.entry(mapped.to_string()).or_insert(value);
                }
                continue;
            }

            match line.split_once(',') {
                Some((field, value)) => fields.insert(field, FieldValue::parse(value)),
                None => debug!(line, "skipping legacy line without a value"),
            }
        }

        fields
    }

    /// Loads a request file, choosing the parser by extension.
    ///
    /// # Errors
    ///
    /// * [`RequestLoadError::UnsupportedFormat`] for anything but `.json`/`.txt`.
    /// * [`RequestLoadError::Io`] when the file cannot be read.
    /// * [`RequestLoadError::Json`] / [`RequestLoadError::NotAnObject`] for bad JSON.
    pub fn load(
        mode: EstimateMode,
        path: &Path,
    ) -> Result<Self, RequestLoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let read = || {
            fs::read_to_string(path).map_err(|source| RequestLoadError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        match extension.as_deref() {
            Some("json") => Self::from_json_str(mode, &read()?),
            Some("txt") => Ok(Self::from_legacy_text(mode, &read()?)),
            _ => Err(RequestLoadError::UnsupportedFormat(
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string()),
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Typed views
    // -----------------------------------------------------------------------

    /// Residential input with the legacy defaults filling absent or blank cells.
    pub fn to_residential_input(&self) -> ResidentialInput {
        let defaults = ResidentialInput::default();

        ResidentialInput {
            tier: self.text(RES_TIER).unwrap_or(defaults.tier),
            interior_sf: self.number(RES_INTERIOR_SF, defaults.interior_sf),
            site_acres: self.number(RES_SITE_ACRES, defaults.site_acres),
            bed_count: self.number(RES_BED_COUNT, defaults.bed_count),
            bath_count: self.number(RES_BATH_COUNT, defaults.bath_count),
            tenant_count: self.number(RES_TENANT_COUNT, defaults.tenant_count),
            flooring_fraction: self.number(RES_FLOORING, defaults.flooring_fraction),
            landscape_fraction: self.number(RES_LANDSCAPE, defaults.landscape_fraction),
            hardscape_fraction: self.number(RES_HARDSCAPE, defaults.hardscape_fraction),
            parking_fraction: self.number(RES_PARKING, defaults.parking_fraction),
            solar_count: self.number(RES_SOLAR_COUNT, defaults.solar_count),
            pool_count: self.number(RES_POOL_COUNT, defaults.pool_count),
            basis: self.number(RES_BASIS, defaults.basis),
            national_avg_per_sf: self.number(RES_NATIONAL_AVG, defaults.national_avg_per_sf),
            in_service_date: self.date(IN_SERVICE_DATE),
            study_year: self.year(STUDY_YEAR),
            property_address: self.property_address(),
        }
    }

    /// Commercial input. An absent property type defaults to `Bank`; a blank
    /// one stays blank and fails the guideline lookup.
    pub fn to_commercial_input(&self) -> CommercialInput {
        let defaults = CommercialInput::default();

        let property_type = match self.values.get(COM_PROPERTY_TYPE) {
            None => defaults.property_type,
            Some(value) => value.to_string().trim().to_string(),
        };

        CommercialInput {
            basis: self.number(COM_BASIS, defaults.basis),
            property_type,
            in_service_date: self.date(IN_SERVICE_DATE),
            study_year: self.year(STUDY_YEAR),
            property_address: self.property_address(),
        }
    }

    fn number(
        &self,
        cell: &str,
        default: Decimal,
    ) -> Decimal {
        match self.values.get(cell) {
            None | Some(FieldValue::Blank) => default,
            Some(value) => value.as_decimal().unwrap_or_else(|| {
                warn!(cell, value = %value, "non-numeric value, using 0");
                Decimal::ZERO
            }),
        }
    }

    fn text(
        &self,
        cell: &str,
    ) -> Option<String> {
        self.values
            .get(cell)
            .and_then(FieldValue::as_text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
    }

    fn date(
        &self,
        cell: &str,
    ) -> Option<NaiveDate> {
        self.values.get(cell).and_then(parse_flexible_date)
    }

    fn year(
        &self,
        cell: &str,
    ) -> Option<i32> {
        match self.values.get(cell) {
            None | Some(FieldValue::Blank) => None,
            Some(value) => {
                let year = value.as_year();
                if year.is_none() {
                    warn!(cell, value = %value, "unparseable study year, treating as absent");
                }
                year
            }
        }
    }

    fn property_address(&self) -> Option<String> {
        self.values
            .iter()
            .find(|(key, _)| ADDRESS_KEYS.contains(&normalize_key(key).as_str()))
            .and_then(|(_, value)| value.as_text())
    }
}

fn json_to_field(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Blank,
        Value::String(text) => FieldValue::parse(text),
        Value::Number(number) => {
            let text = number.to_string();
            text.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&text))
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Text(text))
        }
        Value::Bool(flag) => FieldValue::Text(flag.to_string()),
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Examples
// ---------------------------------------------------------------------------

/// A minimal field-keyed request for `mode`.
pub fn example_payload(mode: EstimateMode) -> Value {
    match mode {
        EstimateMode::Residential => json!({
            "Tier": "SFR$$",
            "Interior SF": 1620,
            "Site Acres": 0.26,
            "Bed Cnt": 4,
            "Bath Cnt": 2,
            "Tenant Cnt": 1,
            "Flooring (Sans Tile) %": "100%",
            "Landscape %": "60%",
            "Hardscape %": "10%",
            "Parking Lot %": "0%",
            "Solar Cnt": 0,
            "Basis": 700000,
            "National Avg $/SF (Res.)": 130,
            "Date Placed in Service": "2021-01-01",
            "Study Tax Year": 2025
        }),
        EstimateMode::Commercial => json!({
            "Basis": "2,750,000",
            "Property Type": "Medical Center",
            "In-Service Date": "2018-06-15",
            "Study Tax Year": 2025
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
