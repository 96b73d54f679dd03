//! Classifies every native / wrapped-native inflow of a transaction into marketplace
//! fees, collection royalties, or possible missing royalties.

use super::{AttributionConfig, AttributionError, FeeBucket, TransactionContext, ZeroDenominatorPolicy};
use crate::domain::{Address, AssetStateId, BalanceDelta, FeeBreakdown, Wei};
use alloy_primitives::U256;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// One qualifying inflow, whatever bucket it ended up in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub recipient: Address,
    pub inflow: Wei,
    pub bps_of_sale_price: U256,
}

/// Per-bucket breakdowns, each sorted by recipient.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub royalty_fee_breakdown: Vec<FeeBreakdown>,
    pub marketplace_fee_breakdown: Vec<FeeBreakdown>,
    pub possible_missing_royalties: Vec<FeeBreakdown>,
    /// Unfiltered audit trail of every qualifying inflow.
    pub balance_changes: Vec<BalanceChange>,
}

pub struct FeeClassifier<'a> {
    config: &'a AttributionConfig,
}

impl<'a> FeeClassifier<'a> {
    pub fn new(config: &'a AttributionConfig) -> Self {
        Self { config }
    }

    /// Classify all inflows of the transaction relative to a sale priced at `price`.
    pub fn classify(
        &self,
        price: Wei,
        context: &TransactionContext,
    ) -> Result<Classification, AttributionError> {
        if price.is_zero() {
            return Err(AttributionError::ZeroPrice);
        }

        let royalty_recipients: HashSet<&Address> =
            context.royalties.iter().map(|r| &r.recipient).collect();

        let mut result = Classification::default();
        for (address, states) in &context.balance_deltas {
            let Some(inflow) = self.currency_inflow(states) else {
                continue;
            };

            let bps_of_sale_price = inflow
                .basis_points_of(price)
                .ok_or_else(|| AttributionError::AmountOverflow(format!("inflow of {}", address)))?;

            if let Some((bucket, bps)) =
                self.bucket_for(address, inflow, bps_of_sale_price, price, context, &royalty_recipients)?
            {
                let entry = FeeBreakdown::new(*address, bps);
                match bucket {
                    FeeBucket::Marketplace => result.marketplace_fee_breakdown.push(entry),
                    FeeBucket::Royalty => result.royalty_fee_breakdown.push(entry),
                    FeeBucket::PossibleMissingRoyalty => result.possible_missing_royalties.push(entry),
                }
            }

            result.balance_changes.push(BalanceChange {
                recipient: *address,
                inflow,
                bps_of_sale_price,
            });
        }

        result.royalty_fee_breakdown.sort_by(|a, b| a.recipient.cmp(&b.recipient));
        result.marketplace_fee_breakdown.sort_by(|a, b| a.recipient.cmp(&b.recipient));
        result.possible_missing_royalties.sort_by(|a, b| a.recipient.cmp(&b.recipient));
        result.balance_changes.sort_by(|a, b| a.recipient.cmp(&b.recipient));
        Ok(result)
    }

    /// Native balance first; the wrapped-native balance only when there is no native entry.
    fn currency_inflow(&self, states: &HashMap<AssetStateId, BalanceDelta>) -> Option<Wei> {
        states
            .get(self.config.native_key())
            .or_else(|| states.get(self.config.wrapped_key()))
            .and_then(BalanceDelta::inflow)
    }

    fn bucket_for(
        &self,
        address: &Address,
        inflow: Wei,
        bps_of_sale_price: U256,
        price: Wei,
        context: &TransactionContext,
        royalty_recipients: &HashSet<&Address>,
    ) -> Result<Option<(FeeBucket, u64)>, AttributionError> {
        if self.config.fee_recipients.contains(address) {
            let bps = self.normalised_bps(
                FeeBucket::Marketplace,
                address,
                inflow,
                context.protocol_related_amount,
                price,
            )?;
            return Ok(Some((FeeBucket::Marketplace, bps)));
        }

        if royalty_recipients.contains(address) {
            let bps = self.normalised_bps(
                FeeBucket::Royalty,
                address,
                inflow,
                context.collection_related_amount,
                price,
            )?;
            return Ok(Some((FeeBucket::Royalty, bps)));
        }

        if bps_of_sale_price < U256::from(self.config.missing_royalty_threshold_bps) {
            let bps = to_bps(bps_of_sale_price, address)?;
            return Ok(Some((FeeBucket::PossibleMissingRoyalty, bps)));
        }

        Ok(None)
    }

    fn normalised_bps(
        &self,
        bucket: FeeBucket,
        address: &Address,
        inflow: Wei,
        related_amount: Wei,
        price: Wei,
    ) -> Result<u64, AttributionError> {
        let denominator = if related_amount.is_zero() {
            match self.config.zero_denominator {
                ZeroDenominatorPolicy::SalePrice => {
                    warn!(
                        recipient = %address,
                        bucket = %bucket,
                        "No related sale volume in transaction, normalising against sale price"
                    );
                    price
                }
                ZeroDenominatorPolicy::Fail => {
                    return Err(AttributionError::DegenerateDenominator {
                        bucket,
                        recipient: *address,
                    })
                }
            }
        } else {
            related_amount
        };

        let bps = inflow
            .basis_points_of(denominator)
            .ok_or_else(|| AttributionError::AmountOverflow(format!("{} of {}", bucket, address)))?;
        to_bps(bps, address)
    }
}

fn to_bps(value: U256, address: &Address) -> Result<u64, AttributionError> {
    u64::try_from(value)
        .map_err(|_| AttributionError::AmountOverflow(format!("basis points of {}", address)))
}
