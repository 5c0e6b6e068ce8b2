mod asset_class;
mod field_value;
mod guideline;
mod lookback;

pub use asset_class::{AssetClass, Convention};
pub use field_value::FieldValue;
pub use guideline::{
    DEP_LIFE_HEADERS, FIFTEEN_YEAR_HEADERS, FIVE_YEAR_HEADERS, GuidelineMatch, GuidelineRow,
    GuidelineTable, GuidelineTableError, NONRESIDENTIAL_HEADERS, PROPERTY_TYPE_HEADERS,
    SEVEN_YEAR_HEADERS, TOTAL_ACCELERATED_HEADERS,
};
pub use lookback::{ClassLookback, LookbackResult, LookbackRow, LookbackSummary};
