//! Depreciation calculations.
//!
//! This module provides the rounding and date kernel, the schedule generator,
//! and the residential and commercial allocators built on top of them.

pub mod common;
pub mod commercial;
pub mod dates;
pub mod projection;
pub mod residential;
pub mod schedule;

pub use common::{
    MAX_INPUT_AMOUNT, bounded_amount, clamp_fraction, round_half_away, whole_dollars,
};
pub use dates::parse_flexible_date;
