//! Write side: reconstructed fills and configured royalties.

use crate::api::AppState;
use crate::domain::{Address, FillRecord, Royalty, TokenId, BPS_SCALE};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Deserialize)]
pub struct IngestFillsRequest {
    pub fills: Vec<FillRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFillsResponse {
    pub received: usize,
    pub inserted: usize,
}

pub async fn post_fills(
    State(state): State<AppState>,
    Json(body): Json<IngestFillsRequest>,
) -> Result<Json<IngestFillsResponse>, AppError> {
    let inserted = state.repo.insert_fill_records(&body.fills).await?;
    Ok(Json(IngestFillsResponse {
        received: body.fills.len(),
        inserted,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRoyaltiesRequest {
    pub token_id: Option<String>,
    pub royalties: Vec<Royalty>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRoyaltiesResponse {
    pub contract: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<TokenId>,
    pub royalties: Vec<Royalty>,
}

pub async fn put_collection_royalties(
    Path(contract): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<CollectionRoyaltiesRequest>,
) -> Result<Json<CollectionRoyaltiesResponse>, AppError> {
    let contract = Address::from_str(&contract)?;

    let token_id = match body.token_id {
        Some(id) if id.is_empty() => {
            return Err(AppError::BadRequest("tokenId must not be empty".into()))
        }
        Some(id) => Some(TokenId::new(id)),
        None => None,
    };

    let total = body
        .royalties
        .iter()
        .try_fold(0u64, |total, r| total.checked_add(r.bps))
        .filter(|total| *total <= BPS_SCALE);
    if total.is_none() {
        return Err(AppError::BadRequest(format!(
            "royalty shares must add up to at most {} bps",
            BPS_SCALE
        )));
    }

    state
        .repo
        .replace_royalties(&contract, token_id.as_ref(), &body.royalties)
        .await?;

    Ok(Json(CollectionRoyaltiesResponse {
        contract,
        token_id,
        royalties: body.royalties,
    }))
}
