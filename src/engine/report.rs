//! Assembles the compliance report from the classifier and counter outputs.

use super::{AttributionError, Classification, SaleActivity};
use crate::domain::{total_bps, Decimal, FillEvent, Royalty, RoyaltyComplianceReport, SaleSummary};
use std::collections::HashSet;
use tracing::debug;

pub struct ReportBuilder;

impl ReportBuilder {
    pub fn build(
        fill: &FillEvent,
        classification: Classification,
        activity: SaleActivity,
        royalties: &[Royalty],
    ) -> Result<RoyaltyComplianceReport, AttributionError> {
        let price_in_decimal = Decimal::from_wei(fill.price)
            .map_err(|e| AttributionError::AmountOverflow(format!("price {}: {}", fill.price, e)))?;
        let royalty_fee_basis_points = total_bps(&classification.royalty_fee_breakdown)
            .ok_or_else(|| AttributionError::AmountOverflow("royalty fee total".to_string()))?;
        let marketplace_fee_basis_points = total_bps(&classification.marketplace_fee_breakdown)
            .ok_or_else(|| AttributionError::AmountOverflow("marketplace fee total".to_string()))?;

        for change in &classification.balance_changes {
            debug!(
                tx_hash = %fill.tx_hash(),
                recipient = %change.recipient,
                inflow = %change.inflow,
                bps = %change.bps_of_sale_price,
                "Balance change"
            );
        }

        let configured_recipients: HashSet<_> = royalties.iter().map(|r| &r.recipient).collect();
        let paid_full_royalty =
            classification.royalty_fee_breakdown.len() == configured_recipients.len();

        Ok(RoyaltyComplianceReport {
            transaction_hash: *fill.tx_hash(),
            sale: SaleSummary {
                token_id: fill.token_id.clone(),
                collection_contract: fill.contract,
                price_in_decimal,
            },
            total_transfers: activity.total_transfers,
            royalty_fee_basis_points,
            marketplace_fee_basis_points,
            royalty_fee_breakdown: classification.royalty_fee_breakdown,
            marketplace_fee_breakdown: classification.marketplace_fee_breakdown,
            possible_missing_royalties: classification.possible_missing_royalties,
            same_collection_sales: activity.same_collection_sales,
            paid_full_royalty,
        })
    }
}
