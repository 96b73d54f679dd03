pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use datasource::{
    BalanceDeltaComputer, CallTraceDeltaComputer, DataSourceError, FillEventSource,
    MockDataSource, RoyaltyRegistry, RpcTraceProvider, TraceProvider,
};
pub use db::{init_db, Repository};
pub use domain::{
    Address, FeeBreakdown, FillEvent, FillRecord, Royalty, RoyaltyComplianceReport, TokenId,
    TxHash, Wei,
};
pub use engine::{AttributionConfig, AttributionError};
pub use error::AppError;
pub use orchestration::{Orchestrator, RoyaltyAttributor};
