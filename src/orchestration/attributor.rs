//! Royalty attribution for a single sale.

use super::context::TransactionContextAggregator;
use crate::domain::{FillEvent, RoyaltyComplianceReport};
use crate::engine::{
    AttributionConfig, AttributionError, FeeClassifier, ReportBuilder, SaleActivityCounter,
};
use tracing::info;

#[derive(Debug, Clone)]
pub struct RoyaltyAttributor {
    aggregator: TransactionContextAggregator,
    config: AttributionConfig,
}

impl RoyaltyAttributor {
    pub fn new(aggregator: TransactionContextAggregator, config: AttributionConfig) -> Self {
        Self { aggregator, config }
    }

    /// Reconstruct how the proceeds of `fill` were split.
    ///
    /// Returns `Ok(None)` when the trace of the transaction is unavailable, whatever
    /// the fill's price. Either a full report is produced or none at all.
    pub async fn attribute_royalties(
        &self,
        fill: &FillEvent,
    ) -> Result<Option<RoyaltyComplianceReport>, AttributionError> {
        let Some(context) = self.aggregator.gather(fill).await? else {
            return Ok(None);
        };

        let classification = FeeClassifier::new(&self.config).classify(fill.price, &context)?;
        let activity = SaleActivityCounter::count(&context.balance_deltas, &fill.contract);
        let report = ReportBuilder::build(fill, classification, activity, &context.royalties)?;

        info!(
            tx_hash = %report.transaction_hash,
            contract = %fill.contract,
            token_id = %fill.token_id,
            royalty_bps = report.royalty_fee_basis_points,
            marketplace_bps = report.marketplace_fee_basis_points,
            paid_full_royalty = report.paid_full_royalty,
            "Attributed sale proceeds"
        );

        Ok(Some(report))
    }
}
