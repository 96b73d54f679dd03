//! Gathers the transaction context for one sale from the collaborators.

use crate::datasource::{BalanceDeltaComputer, FillEventSource, RoyaltyRegistry, TraceProvider};
use crate::domain::{flatten_fill_events, FillEvent, Wei};
use crate::engine::{AttributionError, TransactionContext};
use std::sync::Arc;
use tracing::{debug, warn};

/// The four external collaborators of the attribution engine.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub traces: Arc<dyn TraceProvider>,
    pub fills: Arc<dyn FillEventSource>,
    pub balances: Arc<dyn BalanceDeltaComputer>,
    pub royalties: Arc<dyn RoyaltyRegistry>,
}

#[derive(Debug, Clone)]
pub struct TransactionContextAggregator {
    collaborators: Collaborators,
}

impl TransactionContextAggregator {
    pub fn new(collaborators: Collaborators) -> Self {
        Self { collaborators }
    }

    /// Build the context for `fill`, or `None` when its trace is unavailable.
    pub async fn gather(
        &self,
        fill: &FillEvent,
    ) -> Result<Option<TransactionContext>, AttributionError> {
        let tx_hash = fill.tx_hash();

        let Some(trace) = self.collaborators.traces.fetch_trace(tx_hash).await? else {
            warn!(tx_hash = %tx_hash, "Trace unavailable, skipping royalty attribution");
            return Ok(None);
        };

        let (on_chain_data, royalties) = futures::try_join!(
            self.collaborators.fills.fetch_on_chain_data(tx_hash),
            self.collaborators
                .royalties
                .get_default_royalties(&fill.contract, &fill.token_id),
        )?;

        let fills = flatten_fill_events(on_chain_data);
        let collection_related_amount =
            sum_prices(fills.iter().filter(|f| f.contract == fill.contract))?;
        let protocol_related_amount =
            sum_prices(fills.iter().filter(|f| f.order_kind == fill.order_kind))?;

        debug!(
            tx_hash = %tx_hash,
            fills = fills.len(),
            protocol_related_amount = %protocol_related_amount,
            collection_related_amount = %collection_related_amount,
            "Aggregated transaction sales"
        );

        let balance_deltas = self.collaborators.balances.compute_balance_deltas(&trace)?;

        Ok(Some(TransactionContext {
            balance_deltas,
            protocol_related_amount,
            collection_related_amount,
            royalties,
        }))
    }
}

fn sum_prices<'a>(mut fills: impl Iterator<Item = &'a FillEvent>) -> Result<Wei, AttributionError> {
    fills.try_fold(Wei::ZERO, |total, f| {
        total
            .checked_add(f.price)
            .ok_or_else(|| AttributionError::AmountOverflow("related sale volume".to_string()))
    })
}
