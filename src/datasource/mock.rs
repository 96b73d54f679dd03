//! Mock collaborators for testing without a node or database.

use super::{
    BalanceDeltaComputer, DataSourceError, FillEventSource, RoyaltyRegistry, Trace, TraceProvider,
};
use crate::domain::{
    Address, AssetStateId, BalanceDelta, BalanceDeltaMap, OnChainData, Royalty, TokenId, TxHash,
};
use async_trait::async_trait;
use std::collections::HashMap;

/// In-memory implementation of every collaborator, returning predefined data.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    traces: HashMap<TxHash, Trace>,
    on_chain_data: HashMap<TxHash, Vec<OnChainData>>,
    royalties: HashMap<Address, Vec<Royalty>>,
    balance_deltas: BalanceDeltaMap,
    fail_fills: Option<DataSourceError>,
    fail_royalties: Option<DataSourceError>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a trace available for the transaction.
    pub fn with_trace(mut self, tx_hash: TxHash, trace: Trace) -> Self {
        self.traces.insert(tx_hash, trace);
        self
    }

    /// Add one decoded log for the transaction.
    pub fn with_on_chain_data(mut self, tx_hash: TxHash, data: OnChainData) -> Self {
        self.on_chain_data.entry(tx_hash).or_default().push(data);
        self
    }

    pub fn with_royalties(mut self, contract: Address, royalties: Vec<Royalty>) -> Self {
        self.royalties.insert(contract, royalties);
        self
    }

    /// Set a balance delta returned for any trace.
    pub fn with_balance_delta(mut self, address: Address, state: AssetStateId, delta: BalanceDelta) -> Self {
        self.balance_deltas
            .entry(address)
            .or_default()
            .insert(state, delta);
        self
    }

    pub fn with_fill_source_failure(mut self, err: DataSourceError) -> Self {
        self.fail_fills = Some(err);
        self
    }

    pub fn with_royalty_failure(mut self, err: DataSourceError) -> Self {
        self.fail_royalties = Some(err);
        self
    }
}

#[async_trait]
impl TraceProvider for MockDataSource {
    async fn fetch_trace(&self, tx_hash: &TxHash) -> Result<Option<Trace>, DataSourceError> {
        Ok(self.traces.get(tx_hash).cloned())
    }
}

#[async_trait]
impl FillEventSource for MockDataSource {
    async fn fetch_on_chain_data(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Vec<OnChainData>, DataSourceError> {
        if let Some(err) = &self.fail_fills {
            return Err(err.clone());
        }
        Ok(self.on_chain_data.get(tx_hash).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl RoyaltyRegistry for MockDataSource {
    async fn get_default_royalties(
        &self,
        contract: &Address,
        _token_id: &TokenId,
    ) -> Result<Vec<Royalty>, DataSourceError> {
        if let Some(err) = &self.fail_royalties {
            return Err(err.clone());
        }
        Ok(self.royalties.get(contract).cloned().unwrap_or_default())
    }
}

impl BalanceDeltaComputer for MockDataSource {
    fn compute_balance_deltas(&self, _trace: &Trace) -> Result<BalanceDeltaMap, DataSourceError> {
        Ok(self.balance_deltas.clone())
    }
}
