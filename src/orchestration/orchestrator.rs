use crate::db::Repository;
use crate::domain::{FillEvent, RoyaltyComplianceReport};
use crate::engine::AttributionError;
use crate::orchestration::attributor::RoyaltyAttributor;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Orchestrator {
    attributor: RoyaltyAttributor,
    repo: Arc<Repository>,
}

impl Orchestrator {
    pub fn new(attributor: RoyaltyAttributor, repo: Arc<Repository>) -> Self {
        Self { attributor, repo }
    }

    /// Return the stored report for `fill`, attributing and storing it first if needed.
    ///
    /// `Ok(None)` (trace unavailable) is not stored, so a later call retries.
    pub async fn ensure_report(
        &self,
        fill: &FillEvent,
    ) -> Result<Option<RoyaltyComplianceReport>, OrchestrationError> {
        if let Some(report) = self
            .repo
            .get_report(fill.tx_hash(), &fill.contract, &fill.token_id)
            .await?
        {
            debug!(fill_key = %fill.fill_key(), "Serving stored royalty report");
            return Ok(Some(report));
        }

        let Some(report) = self.attributor.attribute_royalties(fill).await? else {
            return Ok(None);
        };

        self.repo.upsert_report(&report).await?;
        Ok(Some(report))
    }
}

#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error(transparent)]
    Attribution(#[from] AttributionError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
