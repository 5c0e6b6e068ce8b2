use std::fmt;

use serde::{Deserialize, Serialize};

/// Statutory recovery class an allocated basis is depreciated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    FiveYear,
    SevenYear,
    FifteenYear,
    /// 27.5-year residential rental building.
    ResidentialRental,
    /// 39-year nonresidential real property.
    Nonresidential,
}

/// Placed-in-service convention behind a recovery table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    HalfYear,
    MidMonth,
}

impl AssetClass {
    pub const ALL: [AssetClass; 5] = [
        Self::FiveYear,
        Self::SevenYear,
        Self::FifteenYear,
        Self::ResidentialRental,
        Self::Nonresidential,
    ];

    /// Number of rows in the class's recovery table. Building tables carry
    /// one extra row for the mid-month stub year.
    pub fn max_table_years(self) -> u32 {
        match self {
            Self::FiveYear => 6,
            Self::SevenYear => 8,
            Self::FifteenYear => 16,
            Self::ResidentialRental => 29,
            Self::Nonresidential => 40,
        }
    }

    pub fn is_building(self) -> bool {
        matches!(self, Self::ResidentialRental | Self::Nonresidential)
    }

    pub fn convention(self) -> Convention {
        if self.is_building() {
            Convention::MidMonth
        } else {
            Convention::HalfYear
        }
    }

    /// Recovery period as printed on a schedule ("5", "27.5", ...).
    pub fn recovery_period(self) -> &'static str {
        match self {
            Self::FiveYear => "5",
            Self::SevenYear => "7",
            Self::FifteenYear => "15",
            Self::ResidentialRental => "27.5",
            Self::Nonresidential => "39",
        }
    }

    /// Column key used by the yearly projection. Both building classes
    /// share the "long" column.
    pub fn bucket_key(self) -> &'static str {
        match self {
            Self::FiveYear => "5yr",
            Self::SevenYear => "7yr",
            Self::FifteenYear => "15yr",
            Self::ResidentialRental | Self::Nonresidential => "long",
        }
    }

    /// Parses a recovery period or class name (`"5"`, `"15-yr"`, `"27.5"`,
    /// `"nonresidential"`). Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        let period = normalized
            .trim_end_matches("year")
            .trim_end_matches("yr")
            .trim_end_matches(['-', ' ']);
        match period {
            "5" => Some(Self::FiveYear),
            "7" => Some(Self::SevenYear),
            "15" => Some(Self::FifteenYear),
            "27.5" | "residential" | "residential_rental" => Some(Self::ResidentialRental),
            "39" | "nonresidential" | "building" => Some(Self::Nonresidential),
            _ => None,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}-year", self.recovery_period())
    }
}
