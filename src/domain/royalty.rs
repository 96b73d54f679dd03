//! Royalty shares and the compliance report produced for a sale.

use crate::domain::{Address, Decimal, TokenId, TxHash};
use serde::{Deserialize, Serialize};

/// A configured royalty share from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Royalty {
    pub recipient: Address,
    pub bps: u64,
}

/// A share observed in the transaction's balance changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub recipient: Address,
    pub bps: u64,
}

impl FeeBreakdown {
    pub fn new(recipient: Address, bps: u64) -> Self {
        FeeBreakdown { recipient, bps }
    }
}

/// Sum of `bps` over a breakdown list, `None` on overflow.
pub fn total_bps(breakdown: &[FeeBreakdown]) -> Option<u64> {
    breakdown.iter().try_fold(0u64, |acc, b| acc.checked_add(b.bps))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSummary {
    pub token_id: TokenId,
    pub collection_contract: Address,
    /// Sale price in whole native units.
    pub price_in_decimal: Decimal,
}

/// How the proceeds of one sale were split, reconstructed from its transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoyaltyComplianceReport {
    pub transaction_hash: TxHash,
    pub sale: SaleSummary,
    /// NFT inflows across the whole transaction.
    pub total_transfers: u64,
    pub royalty_fee_basis_points: u64,
    pub marketplace_fee_basis_points: u64,
    pub royalty_fee_breakdown: Vec<FeeBreakdown>,
    pub marketplace_fee_breakdown: Vec<FeeBreakdown>,
    /// Small unattributed payouts; not part of either total.
    pub possible_missing_royalties: Vec<FeeBreakdown>,
    /// NFT inflows of the sale's collection across the whole transaction.
    pub same_collection_sales: u64,
    /// Every configured recipient received something (amounts are not checked).
    pub paid_full_royalty: bool,
}
