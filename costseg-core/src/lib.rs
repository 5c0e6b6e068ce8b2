//! Depreciation engine for real-estate cost-segregation estimates.
//!
//! The crate is organised leaf-first:
//!
//! - [`calculations::common`] and [`calculations::dates`]: spreadsheet-compatible
//!   rounding and date coercion.
//! - [`tables`]: the bonus-depreciation schedule and MACRS recovery tables.
//! - [`calculations::schedule`]: lookback and full-life schedule generation.
//! - [`calculations::residential`] and [`calculations::commercial`]: the two
//!   allocators that split a basis into asset-class buckets.
//! - [`calculations::projection`]: the `summary + yearly` flattening consumed
//!   by document renderers.
//!
//! Every entry point is a pure function of its inputs.

pub mod calculations;
pub mod models;
pub mod tables;

pub use calculations::commercial::{
    CommercialEstimator, CommercialInput, CommercialResult, compute_commercial,
};
pub use calculations::projection::{EstimatorPayload, EstimatorSummary, YearlyAmounts};
pub use calculations::residential::{
    ResidentialEstimator, ResidentialInput, ResidentialResult, compute_residential,
};
pub use calculations::schedule::{DepreciationSchedule, compute_full_schedule, compute_lookback};
pub use models::*;
pub use tables::{BonusRange, BonusSchedule, BonusScheduleError};
