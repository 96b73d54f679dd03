//! Fill events: one resolved NFT sale, plus the variant wrapper the reconstruction
//! pipeline emits them in.

use crate::domain::{Address, OrderKind, TokenId, TxHash, Wei};
use serde::{Deserialize, Serialize};

/// Log-level context shared by every event decoded from the same log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseEventParams {
    /// Contract that emitted the log (the exchange).
    pub address: Address,
    pub block: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<TxHash>,
    pub tx_hash: TxHash,
    #[serde(default)]
    pub tx_index: u32,
    pub log_index: u32,
    /// Position of this sale among the sales decoded from the same log.
    #[serde(default)]
    pub batch_index: u32,
    /// Block timestamp in seconds.
    pub timestamp: i64,
}

/// A single completed NFT sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillEvent {
    pub order_kind: OrderKind,
    /// Collection contract.
    pub contract: Address,
    pub token_id: TokenId,
    /// Sale price in wei.
    pub price: Wei,
    pub base_event_params: BaseEventParams,
}

impl FillEvent {
    pub fn tx_hash(&self) -> &TxHash {
        &self.base_event_params.tx_hash
    }

    /// Stable key for a fill within the chain: transaction, log and batch position.
    pub fn fill_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.base_event_params.tx_hash,
            self.base_event_params.log_index,
            self.base_event_params.batch_index
        )
    }
}

/// How the reconstruction pipeline resolved a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillVariant {
    /// Matched to a known order.
    Confirmed,
    /// Partially filled order.
    Partial,
    /// Decoded from chain data only; no off-chain order known.
    OnChain,
}

impl FillVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillVariant::Confirmed => "confirmed",
            FillVariant::Partial => "partial",
            FillVariant::OnChain => "on_chain",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(FillVariant::Confirmed),
            "partial" => Some(FillVariant::Partial),
            "on_chain" => Some(FillVariant::OnChain),
            _ => None,
        }
    }
}

/// A fill event tagged with the variant it was reconstructed as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillRecord {
    pub variant: FillVariant,
    #[serde(flatten)]
    pub event: FillEvent,
}

impl FillRecord {
    pub fn new(variant: FillVariant, event: FillEvent) -> Self {
        FillRecord { variant, event }
    }

    pub fn into_fill_event(self) -> FillEvent {
        self.event
    }
}

/// Everything decoded from one enhanced event (log).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnChainData {
    pub fills: Vec<FillRecord>,
}

impl OnChainData {
    pub fn new(fills: Vec<FillRecord>) -> Self {
        OnChainData { fills }
    }
}

/// Flatten every variant of every log into one sequence of fill events.
pub fn flatten_fill_events(data: Vec<OnChainData>) -> Vec<FillEvent> {
    data.into_iter()
        .flat_map(|d| d.fills)
        .map(FillRecord::into_fill_event)
        .collect()
}
