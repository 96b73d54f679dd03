//! Stored attribution reports.

use super::Repository;
use crate::domain::{Address, RoyaltyComplianceReport, TokenId, TxHash};
use sqlx::Row;

impl Repository {
    /// Store a report, replacing any earlier one for the same sale.
    ///
    /// # Errors
    /// Returns an error if the report cannot be serialized or the write fails.
    pub async fn upsert_report(&self, report: &RoyaltyComplianceReport) -> Result<(), sqlx::Error> {
        let report_json = serde_json::to_string(report)
            .map_err(|e| sqlx::Error::Protocol(format!("report serialization failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO royalty_reports (tx_hash, contract, token_id, report_json, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(tx_hash, contract, token_id) DO UPDATE SET
                report_json = excluded.report_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(report.transaction_hash.to_string())
        .bind(report.sale.collection_contract.to_string())
        .bind(report.sale.token_id.as_str())
        .bind(report_json)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch the stored report of a sale.
    ///
    /// # Errors
    /// Returns an error if the query fails or the stored JSON no longer decodes.
    pub async fn get_report(
        &self,
        tx_hash: &TxHash,
        contract: &Address,
        token_id: &TokenId,
    ) -> Result<Option<RoyaltyComplianceReport>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT report_json
            FROM royalty_reports
            WHERE tx_hash = ? AND contract = ? AND token_id = ?
            "#,
        )
        .bind(tx_hash.to_string())
        .bind(contract.to_string())
        .bind(token_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let report_json: String = row.try_get("report_json")?;
        serde_json::from_str(&report_json)
            .map(Some)
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "report_json".to_string(),
                source: Box::new(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::{Decimal, FeeBreakdown, SaleSummary};
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn report(royalty_bps: u64) -> RoyaltyComplianceReport {
        let recipient = Address::repeat_byte(0x11);
        RoyaltyComplianceReport {
            transaction_hash: format!("0x{}", "12".repeat(32)).parse().unwrap(),
            sale: SaleSummary {
                token_id: TokenId::new("42".to_string()),
                collection_contract: Address::repeat_byte(0xcc),
                price_in_decimal: Decimal::from_str("1.5").unwrap(),
            },
            total_transfers: 1,
            royalty_fee_basis_points: royalty_bps,
            marketplace_fee_basis_points: 250,
            royalty_fee_breakdown: vec![FeeBreakdown::new(recipient, royalty_bps)],
            marketplace_fee_breakdown: vec![],
            possible_missing_royalties: vec![],
            same_collection_sales: 1,
            paid_full_royalty: true,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get_report() {
        let (repo, _temp) = setup_test_db().await;
        let stored = report(500);
        repo.upsert_report(&stored).await.unwrap();

        let loaded = repo
            .get_report(
                &stored.transaction_hash,
                &stored.sale.collection_contract,
                &stored.sale.token_id,
            )
            .await
            .unwrap();
        assert_eq!(loaded, Some(stored));
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let (repo, _temp) = setup_test_db().await;
        repo.upsert_report(&report(500)).await.unwrap();
        let newer = report(300);
        repo.upsert_report(&newer).await.unwrap();

        let loaded = repo
            .get_report(
                &newer.transaction_hash,
                &newer.sale.collection_contract,
                &newer.sale.token_id,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.royalty_fee_basis_points, 300);
    }

    #[tokio::test]
    async fn test_missing_report_is_none() {
        let (repo, _temp) = setup_test_db().await;
        let stored = report(500);
        let loaded = repo
            .get_report(
                &stored.transaction_hash,
                &stored.sale.collection_contract,
                &TokenId::new("43".to_string()),
            )
            .await
            .unwrap();
        assert!(loaded.is_none());
    }
}
