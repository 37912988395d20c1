use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Postal-code aggregation tier. Each tier is its own non-overlapping partition of the territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "1-digit")]
    OneDigit,       // Coarsest tier
    #[serde(rename = "2-digit")]
    TwoDigit,       // Leitregion
    #[serde(rename = "3-digit")]
    ThreeDigit,
    #[serde(rename = "5-digit")]
    FiveDigit,      // Full postal code
}

impl Granularity {
    /// Number of digits in a code at this tier.
    pub fn digits(&self) -> usize {
        match self {
            Granularity::OneDigit => 1,
            Granularity::TwoDigit => 2,
            Granularity::ThreeDigit => 3,
            Granularity::FiveDigit => 5,
        }
    }

    pub fn from_digits(digits: usize) -> Option<Self> {
        match digits {
            1 => Some(Granularity::OneDigit),
            2 => Some(Granularity::TwoDigit),
            3 => Some(Granularity::ThreeDigit),
            5 => Some(Granularity::FiveDigit),
            _ => None,
        }
    }

    pub fn to_str(&self) -> &'static str {
        match self {
            Granularity::OneDigit => "1-digit",
            Granularity::TwoDigit => "2-digit",
            Granularity::ThreeDigit => "3-digit",
            Granularity::FiveDigit => "5-digit",
        }
    }

    /// Conventional dataset file stem for this tier, e.g. `plz-5stellig`.
    pub fn file_stem(&self) -> String {
        format!("plz-{}stellig", self.digits())
    }

    pub fn order() -> [Granularity; 4] {
        [
            Granularity::OneDigit,
            Granularity::TwoDigit,
            Granularity::ThreeDigit,
            Granularity::FiveDigit,
        ]
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for Granularity {
    type Err = anyhow::Error;

    /// Accepts `5`, `5-digit`, `plz5` and `5stellig` style spellings.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim()
            .trim_start_matches("plz")
            .trim_start_matches('-')
            .trim_end_matches("-digit")
            .trim_end_matches("stellig");
        match digits.parse::<usize>().ok().and_then(Granularity::from_digits) {
            Some(granularity) => Ok(granularity),
            None => bail!("unknown granularity: {s:?} (expected 1, 2, 3 or 5)"),
        }
    }
}
