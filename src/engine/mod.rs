//! Pure attribution engine: classification, activity counting and report building.
//!
//! Nothing here performs I/O. The orchestration layer gathers a [`TransactionContext`]
//! from the collaborators and hands it to these components.

use crate::config::{Config, DEFAULT_MARKETPLACE_FEE_RECIPIENTS, DEFAULT_WRAPPED_NATIVE};
use crate::datasource::DataSourceError;
use crate::domain::{Address, AssetStateId, BalanceDeltaMap, Royalty, Wei};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

pub mod classifier;
pub mod counter;
pub mod report;

pub use classifier::{BalanceChange, Classification, FeeClassifier};
pub use counter::{SaleActivity, SaleActivityCounter};
pub use report::ReportBuilder;

/// Everything the engine needs about the transaction a sale happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionContext {
    pub balance_deltas: BalanceDeltaMap,
    /// Sum of prices of every fill in the transaction with the sale's protocol.
    pub protocol_related_amount: Wei,
    /// Sum of prices of every fill in the transaction with the sale's collection.
    pub collection_related_amount: Wei,
    /// Configured royalties of the sale's collection.
    pub royalties: Vec<Royalty>,
}

/// What to do when a fee or royalty inflow has no matching sale volume to normalise against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDenominatorPolicy {
    /// Normalise against the target sale's price instead.
    #[default]
    SalePrice,
    /// Abort the attribution.
    Fail,
}

/// Known marketplace fee recipients.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeRecipientSet(HashSet<Address>);

impl FeeRecipientSet {
    pub fn new(recipients: impl IntoIterator<Item = Address>) -> Self {
        FeeRecipientSet(recipients.into_iter().collect())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Classification rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributionConfig {
    pub fee_recipients: FeeRecipientSet,
    /// Unattributed inflows below this share of the sale price are flagged.
    pub missing_royalty_threshold_bps: u64,
    pub zero_denominator: ZeroDenominatorPolicy,
    native_key: AssetStateId,
    wrapped_key: AssetStateId,
}

impl AttributionConfig {
    pub fn new(fee_recipients: FeeRecipientSet, wrapped_native: Address) -> Self {
        Self {
            fee_recipients,
            missing_royalty_threshold_bps: 1000,
            zero_denominator: ZeroDenominatorPolicy::default(),
            native_key: AssetStateId::native(),
            wrapped_key: AssetStateId::erc20(wrapped_native),
        }
    }

    pub fn with_missing_royalty_threshold(mut self, bps: u64) -> Self {
        self.missing_royalty_threshold_bps = bps;
        self
    }

    pub fn with_zero_denominator(mut self, policy: ZeroDenominatorPolicy) -> Self {
        self.zero_denominator = policy;
        self
    }

    pub fn native_key(&self) -> &AssetStateId {
        &self.native_key
    }

    pub fn wrapped_key(&self) -> &AssetStateId {
        &self.wrapped_key
    }
}

impl Default for AttributionConfig {
    fn default() -> Self {
        let recipients = DEFAULT_MARKETPLACE_FEE_RECIPIENTS
            .iter()
            .filter_map(|a| a.parse().ok());
        let wrapped = DEFAULT_WRAPPED_NATIVE.parse().unwrap_or_else(|_| Address::zero());
        Self::new(FeeRecipientSet::new(recipients), wrapped)
    }
}

impl From<&Config> for AttributionConfig {
    fn from(config: &Config) -> Self {
        AttributionConfig::new(
            FeeRecipientSet::new(config.marketplace_fee_recipients.iter().cloned()),
            config.wrapped_native_contract,
        )
        .with_missing_royalty_threshold(config.missing_royalty_threshold_bps)
        .with_zero_denominator(config.zero_denominator_policy)
    }
}

/// Bucket an inflow was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeBucket {
    Marketplace,
    Royalty,
    PossibleMissingRoyalty,
}

impl fmt::Display for FeeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeBucket::Marketplace => write!(f, "marketplace fee"),
            FeeBucket::Royalty => write!(f, "royalty"),
            FeeBucket::PossibleMissingRoyalty => write!(f, "possible missing royalty"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AttributionError {
    #[error(transparent)]
    Collaborator(#[from] DataSourceError),
    #[error("{bucket} inflow to {recipient} has no related sale volume to normalise against")]
    DegenerateDenominator { bucket: FeeBucket, recipient: Address },
    #[error("sale price is zero")]
    ZeroPrice,
    #[error("amount overflow while computing {0}")]
    AmountOverflow(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_knows_seaport_recipients() {
        let config = AttributionConfig::default();
        assert_eq!(config.fee_recipients.len(), 3);
        let opensea: Address = "0x0000a26b00c1F0DF003000390027140000fAa719".parse().unwrap();
        assert!(config.fee_recipients.contains(&opensea));
        assert_eq!(config.missing_royalty_threshold_bps, 1000);
        assert_eq!(config.zero_denominator, ZeroDenominatorPolicy::SalePrice);
    }

    #[test]
    fn test_currency_keys() {
        let config = AttributionConfig::default();
        assert_eq!(
            config.native_key().to_string(),
            "native:0x0000000000000000000000000000000000000000"
        );
        assert_eq!(
            config.wrapped_key().to_string(),
            "erc20:0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
        );
    }

    #[test]
    fn test_error_display() {
        let err = AttributionError::DegenerateDenominator {
            bucket: FeeBucket::Royalty,
            recipient: Address::zero(),
        };
        assert_eq!(
            err.to_string(),
            "royalty inflow to 0x0000000000000000000000000000000000000000 has no related sale volume to normalise against"
        );
    }
}
