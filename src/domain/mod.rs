//! Domain types for sale attribution.
//!
//! This module provides:
//! - Exact wei amounts and signed balance deltas (no floating point)
//! - Exact whole-unit Decimal for human-readable prices
//! - Domain primitives: Address, TxHash, OrderKind, TokenId
//! - Asset state identifiers and the balance delta map
//! - Fill events, their reconstruction variants, and the compliance report

pub mod amount;
pub mod asset_state;
pub mod decimal;
pub mod fill;
pub mod primitives;
pub mod royalty;

pub use amount::{AmountParseError, BalanceDelta, Wei, BPS_SCALE};
pub use asset_state::{AssetKind, AssetStateId, AssetStateParseError, BalanceDeltaMap};
pub use decimal::{Decimal, DecimalParseError};
pub use fill::{flatten_fill_events, BaseEventParams, FillEvent, FillRecord, FillVariant, OnChainData};
pub use primitives::{Address, AddressParseError, OrderKind, TokenId, TxHash};
pub use royalty::{total_bps, FeeBreakdown, Royalty, RoyaltyComplianceReport, SaleSummary};
