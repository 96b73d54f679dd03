//! Whole-unit rendering of base-unit amounts.
//!
//! Used to present wei amounts in native units (e.g. the sale price in ether). The
//! digits come straight from the 256-bit integer, so every price has an exact form.

use crate::domain::Wei;
use alloy_primitives::utils::{format_units, parse_units, ParseUnits, UnitsError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Decimals of the native asset.
pub const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimalParseError {
    #[error("invalid decimal {value:?}: {reason}")]
    Invalid { value: String, reason: String },
    #[error("negative decimal {0:?}")]
    Negative(String),
}

/// Exact decimal string without trailing zeros, serialized as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Decimal(String);

impl Decimal {
    /// Convert a wei amount into whole native units (`wei / 10^18`).
    pub fn from_wei(wei: Wei) -> Result<Self, UnitsError> {
        format_units(wei.inner(), NATIVE_DECIMALS).map(|s| Decimal(trim_fraction(s)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn zero() -> Self {
        Decimal("0".to_string())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == "0"
    }
}

fn trim_fraction(mut s: String) -> String {
    if s.contains('.') {
        let keep = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(keep);
    }
    s
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |e: UnitsError| DecimalParseError::Invalid {
            value: s.to_string(),
            reason: e.to_string(),
        };
        match parse_units(s.trim(), NATIVE_DECIMALS).map_err(invalid)? {
            ParseUnits::U256(wei) => Decimal::from_wei(Wei::new(wei)).map_err(invalid),
            ParseUnits::I256(_) => Err(DecimalParseError::Negative(s.to_string())),
        }
    }
}

impl TryFrom<String> for Decimal {
    type Error = DecimalParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Decimal> for String {
    fn from(value: Decimal) -> Self {
        value.0
    }
}
