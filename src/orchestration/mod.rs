//! Wiring of collaborators, the attribution engine and the report store.

pub mod attributor;
pub mod context;
pub mod orchestrator;

pub use attributor::RoyaltyAttributor;
pub use context::{Collaborators, TransactionContextAggregator};
pub use orchestrator::{OrchestrationError, Orchestrator};
