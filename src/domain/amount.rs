//! Exact on-chain amounts: unsigned wei values and signed balance deltas.
//!
//! Both types are parsed once from decimal strings at the collaborator boundary and
//! never touch floating point.

use alloy_primitives::{I256, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Denominator of a basis-point ratio (10000 bps = 100%).
pub const BPS_SCALE: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount {value:?}: {reason}")]
pub struct AmountParseError {
    pub value: String,
    pub reason: String,
}

/// Unsigned amount in the smallest denomination of an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Wei(U256);

impl Wei {
    pub const ZERO: Wei = Wei(U256::ZERO);

    pub fn new(value: U256) -> Self {
        Wei(value)
    }

    pub fn from_u128(value: u128) -> Self {
        Wei(U256::from(value))
    }

    pub fn inner(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_add(rhs.0).map(Wei)
    }

    /// `self * 10000 / reference`, truncating. `None` when `reference` is zero or the
    /// product overflows 256 bits.
    pub fn basis_points_of(&self, reference: Wei) -> Option<U256> {
        self.0
            .checked_mul(U256::from(BPS_SCALE))?
            .checked_div(reference.0)
    }
}

impl FromStr for Wei {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_str_radix(s.trim(), 10)
            .map(Wei)
            .map_err(|e| AmountParseError {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for Wei {
    fn from(value: U256) -> Self {
        Wei(value)
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Signed net balance change of one asset for one address within a transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BalanceDelta(I256);

impl BalanceDelta {
    pub const ZERO: BalanceDelta = BalanceDelta(I256::ZERO);

    pub fn new(value: I256) -> Self {
        BalanceDelta(value)
    }

    pub fn inner(&self) -> I256 {
        self.0
    }

    /// Build a delta from an unsigned magnitude and direction.
    /// `None` when the magnitude does not fit a signed 256-bit integer.
    pub fn from_wei(amount: Wei, outflow: bool) -> Option<Self> {
        let magnitude = I256::try_from(amount.inner()).ok()?;
        if outflow {
            magnitude.checked_neg().map(BalanceDelta)
        } else {
            Some(BalanceDelta(magnitude))
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_outflow(&self) -> bool {
        self.0.is_negative()
    }

    /// The received amount when this delta is not an outflow (zero counts as inflow).
    pub fn inflow(&self) -> Option<Wei> {
        if self.is_outflow() {
            None
        } else {
            Some(Wei(self.0.into_raw()))
        }
    }

    pub fn checked_add(self, rhs: BalanceDelta) -> Option<BalanceDelta> {
        self.0.checked_add(rhs.0).map(BalanceDelta)
    }
}

impl FromStr for BalanceDelta {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        I256::from_dec_str(s.trim())
            .map(BalanceDelta)
            .map_err(|e| AmountParseError {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for BalanceDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for BalanceDelta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BalanceDelta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
