//! Asset state identifiers (`{kind}:{contract}[:{tokenId}]`) and the per-transaction
//! balance delta map keyed by them.

use crate::domain::{Address, AddressParseError, BalanceDelta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Net balance changes of one transaction: address -> asset state -> delta.
pub type BalanceDeltaMap = HashMap<Address, HashMap<AssetStateId, BalanceDelta>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Native,
    Erc20,
    Erc721,
    Erc1155,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Native => "native",
            AssetKind::Erc20 => "erc20",
            AssetKind::Erc721 => "erc721",
            AssetKind::Erc1155 => "erc1155",
        }
    }

    pub fn is_nft(&self) -> bool {
        matches!(self, AssetKind::Erc721 | AssetKind::Erc1155)
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetStateParseError {
    #[error("unknown asset kind: {0}")]
    UnknownKind(String),
    #[error("malformed asset state id: {0}")]
    Malformed(String),
    #[error(transparent)]
    Address(#[from] AddressParseError),
}

/// Identifies one balance slot: an asset kind, its contract and, for NFTs, the token id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetStateId {
    pub kind: AssetKind,
    pub contract: Address,
    pub token_id: Option<String>,
}

impl AssetStateId {
    pub fn native() -> Self {
        AssetStateId {
            kind: AssetKind::Native,
            contract: Address::zero(),
            token_id: None,
        }
    }

    pub fn erc20(contract: Address) -> Self {
        AssetStateId {
            kind: AssetKind::Erc20,
            contract,
            token_id: None,
        }
    }

    pub fn nft(kind: AssetKind, contract: Address, token_id: String) -> Self {
        AssetStateId {
            kind,
            contract,
            token_id: Some(token_id),
        }
    }

    pub fn is_nft(&self) -> bool {
        self.kind.is_nft()
    }
}

impl FromStr for AssetStateId {
    type Err = AssetStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let kind = match parts.next() {
            Some("native") => AssetKind::Native,
            Some("erc20") => AssetKind::Erc20,
            Some("erc721") => AssetKind::Erc721,
            Some("erc1155") => AssetKind::Erc1155,
            Some(other) => return Err(AssetStateParseError::UnknownKind(other.to_string())),
            None => return Err(AssetStateParseError::Malformed(s.to_string())),
        };
        let contract = parts
            .next()
            .ok_or_else(|| AssetStateParseError::Malformed(s.to_string()))?
            .parse::<Address>()?;
        let token_id = match parts.next() {
            Some("") => return Err(AssetStateParseError::Malformed(s.to_string())),
            Some(id) => Some(id.to_string()),
            None => None,
        };
        Ok(AssetStateId {
            kind,
            contract,
            token_id,
        })
    }
}

impl TryFrom<String> for AssetStateId {
    type Error = AssetStateParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetStateId> for String {
    fn from(value: AssetStateId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AssetStateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token_id {
            Some(id) => write!(f, "{}:{}:{}", self.kind, self.contract, id),
            None => write!(f, "{}:{}", self.kind, self.contract),
        }
    }
}
