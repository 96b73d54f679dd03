use crate::api::AppState;
use crate::domain::{Address, FillEvent, RoyaltyComplianceReport, TokenId, TxHash};
use crate::error::AppError;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::str::FromStr;

/// Attribute a sale, reusing the stored report when there is one.
pub async fn attribute_sale(
    State(state): State<AppState>,
    Json(fill): Json<FillEvent>,
) -> Result<Json<RoyaltyComplianceReport>, AppError> {
    match state.orchestrator.ensure_report(&fill).await? {
        Some(report) => Ok(Json(report)),
        None => Err(AppError::NotFound(format!(
            "Trace unavailable for transaction {}",
            fill.tx_hash()
        ))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub tx_hash: String,
    pub contract: String,
    pub token_id: String,
}

pub async fn get_report(
    Query(params): Query<ReportQuery>,
    State(state): State<AppState>,
) -> Result<Json<RoyaltyComplianceReport>, AppError> {
    let tx_hash = TxHash::from_str(&params.tx_hash)?;
    let contract = Address::from_str(&params.contract)?;
    let token_id = TokenId::new(params.token_id);

    state
        .repo
        .get_report(&tx_hash, &contract, &token_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No royalty report for {}", tx_hash)))
}
