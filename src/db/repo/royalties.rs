//! Configured collection royalties.
//!
//! Rows with an empty `token_id` hold the collection-wide default. Token-level rows,
//! when present, replace the default for that token.

use super::{int_column, parse_column, to_sql_int, Repository};
use crate::datasource::{DataSourceError, RoyaltyRegistry};
use crate::domain::{Address, Royalty, TokenId};
use async_trait::async_trait;
use sqlx::Row;
use tracing::{debug, info};

const COLLECTION_DEFAULT: &str = "";

impl Repository {
    /// Replace the royalties configured for a collection, or for one token of it.
    ///
    /// Repeated recipients are merged by summing their shares.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn replace_royalties(
        &self,
        contract: &Address,
        token_id: Option<&TokenId>,
        royalties: &[Royalty],
    ) -> Result<(), sqlx::Error> {
        let key = token_id.map(TokenId::as_str).unwrap_or(COLLECTION_DEFAULT);
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM collection_royalties WHERE contract = ? AND token_id = ?")
            .bind(contract.to_string())
            .bind(key)
            .execute(&mut *tx)
            .await?;

        for royalty in royalties {
            sqlx::query(
                r#"
                INSERT INTO collection_royalties (contract, token_id, recipient, bps)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(contract, token_id, recipient) DO UPDATE SET
                    bps = collection_royalties.bps + excluded.bps
                "#,
            )
            .bind(contract.to_string())
            .bind(key)
            .bind(royalty.recipient.to_string())
            .bind(to_sql_int(royalty.bps)?)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            contract = %contract,
            token_id = key,
            recipients = royalties.len(),
            "Replaced configured royalties"
        );
        Ok(())
    }

    /// Royalties that apply to `token_id` of `contract`, ordered by recipient.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row no longer decodes.
    pub async fn query_royalties(
        &self,
        contract: &Address,
        token_id: &TokenId,
    ) -> Result<Vec<Royalty>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT token_id, recipient, bps
            FROM collection_royalties
            WHERE contract = ? AND token_id IN (?, ?)
            ORDER BY recipient ASC
            "#,
        )
        .bind(contract.to_string())
        .bind(token_id.as_str())
        .bind(COLLECTION_DEFAULT)
        .fetch_all(&self.pool)
        .await?;

        let mut token_level = Vec::new();
        let mut collection_level = Vec::new();
        for row in &rows {
            let royalty = Royalty {
                recipient: parse_column(row, "recipient")?,
                bps: int_column(row, "bps")?,
            };
            let row_token: String = row.try_get("token_id")?;
            if row_token == COLLECTION_DEFAULT {
                collection_level.push(royalty);
            } else {
                token_level.push(royalty);
            }
        }

        let overridden = !token_level.is_empty();
        debug!(
            contract = %contract,
            token_id = %token_id,
            token_override = overridden,
            "Loaded configured royalties"
        );
        Ok(if overridden { token_level } else { collection_level })
    }
}

#[async_trait]
impl RoyaltyRegistry for Repository {
    async fn get_default_royalties(
        &self,
        contract: &Address,
        token_id: &TokenId,
    ) -> Result<Vec<Royalty>, DataSourceError> {
        Ok(self.query_royalties(contract, token_id).await?)
    }
}
