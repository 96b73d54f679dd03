//! Collaborators the attribution engine consumes: call traces, reconstructed fill
//! events, balance deltas and configured royalties.

use crate::domain::{Address, BalanceDeltaMap, OnChainData, Royalty, TokenId, TxHash};
use async_trait::async_trait;
use std::fmt;

pub mod balance;
pub mod mock;
pub mod rpc;
pub mod trace;

pub use balance::CallTraceDeltaComputer;
pub use mock::MockDataSource;
pub use rpc::RpcTraceProvider;
pub use trace::{CallFrame, Trace};

/// Source of raw execution traces.
#[async_trait]
pub trait TraceProvider: Send + Sync + fmt::Debug {
    /// Fetch the call trace of a transaction.
    ///
    /// # Returns
    /// `None` when the transaction is unknown to the node or its trace is unavailable.
    async fn fetch_trace(&self, tx_hash: &TxHash) -> Result<Option<Trace>, DataSourceError>;
}

/// Event reconstruction pipeline: decoded protocol-level sales of a transaction.
#[async_trait]
pub trait FillEventSource: Send + Sync + fmt::Debug {
    /// Fetch every decoded log of the transaction with its fill records.
    ///
    /// Logs that fail to decode are dropped by the implementation.
    async fn fetch_on_chain_data(&self, tx_hash: &TxHash)
        -> Result<Vec<OnChainData>, DataSourceError>;
}

/// Configured royalty recipients of a collection.
#[async_trait]
pub trait RoyaltyRegistry: Send + Sync + fmt::Debug {
    /// Returns an empty list for unknown collections.
    async fn get_default_royalties(
        &self,
        contract: &Address,
        token_id: &TokenId,
    ) -> Result<Vec<Royalty>, DataSourceError>;
}

/// Turns a call trace into per-address net balance changes.
///
/// Must be deterministic for the same trace.
pub trait BalanceDeltaComputer: Send + Sync + fmt::Debug {
    fn compute_balance_deltas(&self, trace: &Trace) -> Result<BalanceDeltaMap, DataSourceError>;
}

/// Error type for collaborator operations.
#[derive(Debug, Clone)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// HTTP error (e.g., 429 rate limit, 5xx server error)
    HttpError { status: u16, message: String },
    /// JSON-RPC error object returned by the node
    RpcError { code: i64, message: String },
    /// Parsing error (invalid JSON or malformed payload)
    ParseError(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Storage backend failure
    Storage(String),
    /// Other error
    Other(String),
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::RpcError { code, message } => {
                write!(f, "RPC error {}: {}", code, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
            DataSourceError::Storage(msg) => write!(f, "Storage error: {}", msg),
            DataSourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for DataSourceError {}

impl From<sqlx::Error> for DataSourceError {
    fn from(err: sqlx::Error) -> Self {
        DataSourceError::Storage(err.to_string())
    }
}
