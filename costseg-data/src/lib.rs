//! Loading stage for the cost segregation engine.
//!
//! Everything that touches raw request text lives here: guideline CSV files,
//! JSON and legacy text requests, and the field-name to cell-key mapping. The
//! engine in `costseg-core` only ever sees typed, already-coerced input.

pub mod guidelines;
pub mod inputs;

pub use guidelines::{GuidelineLoadError, GuidelineLoader};
pub use inputs::{EstimateMode, RequestFields, RequestLoadError, UnknownModeError, example_payload};
