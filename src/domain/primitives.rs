//! Domain primitives: Address, TxHash, OrderKind, TokenId.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("missing 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("invalid hex value {value:?}: {reason}")]
    Invalid { value: String, reason: String },
}

/// Require the `0x` prefix, then hand the digits to alloy's fixed-size hex parser.
fn parse_prefixed<T>(value: &str) -> Result<T, AddressParseError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AddressParseError::MissingPrefix(trimmed.to_string()))?;
    digits.parse::<T>().map_err(|e| AddressParseError::Invalid {
        value: trimmed.to_string(),
        reason: e.to_string(),
    })
}

/// Account or contract address. Displayed and serialized as lowercase hex, so
/// checksum casing never affects equality or storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(alloy_primitives::Address);

impl Address {
    /// The zero address, used as the contract component of the native asset.
    pub fn zero() -> Self {
        Address(alloy_primitives::Address::ZERO)
    }

    pub fn new(inner: alloy_primitives::Address) -> Self {
        Address(inner)
    }

    /// An address made of one repeated byte.
    pub fn repeat_byte(byte: u8) -> Self {
        Address(alloy_primitives::Address::repeat_byte(byte))
    }

    pub fn inner(&self) -> alloy_primitives::Address {
        self.0
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(inner: alloy_primitives::Address) -> Self {
        Address(inner)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s).map(Address)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}

/// Transaction (or block) hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(B256);

impl TxHash {
    pub fn new(inner: B256) -> Self {
        TxHash(inner)
    }

    pub fn inner(&self) -> B256 {
        self.0
    }
}

impl FromStr for TxHash {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s).map(TxHash)
    }
}

impl TryFrom<String> for TxHash {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_slice()))
    }
}

/// Marketplace protocol that produced a fill (e.g. "seaport", "blur").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrderKind(pub String);

impl OrderKind {
    pub fn new(kind: String) -> Self {
        OrderKind(kind)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NFT token id as its decimal string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: String) -> Self {
        TokenId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
