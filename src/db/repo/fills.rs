//! Reconstructed fill events.

use super::{int_column, parse_column, to_sql_int, Repository};
use crate::datasource::{DataSourceError, FillEventSource};
use crate::domain::{
    BaseEventParams, FillEvent, FillRecord, FillVariant, OnChainData, OrderKind, TokenId, TxHash,
};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

impl Repository {
    /// Insert fill records in a single transaction.
    ///
    /// Records already stored for the same `(tx_hash, log_index, batch_index)` are left
    /// untouched. Returns the number of newly inserted rows.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_fill_records(&self, records: &[FillRecord]) -> Result<usize, sqlx::Error> {
        if records.is_empty() {
            return Ok(0);
        }

        let created_at = chrono::Utc::now().timestamp_millis();
        let mut inserted = 0usize;
        let mut tx = self.pool.begin().await?;

        for record in records {
            let event = &record.event;
            let params = &event.base_event_params;
            let result = sqlx::query(
                r#"
                INSERT INTO fill_events (
                    tx_hash, log_index, batch_index, variant, order_kind, contract,
                    token_id, price, address, block, block_hash, tx_index, timestamp, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(tx_hash, log_index, batch_index) DO NOTHING
                "#,
            )
            .bind(params.tx_hash.to_string())
            .bind(i64::from(params.log_index))
            .bind(i64::from(params.batch_index))
            .bind(record.variant.as_str())
            .bind(event.order_kind.as_str())
            .bind(event.contract.to_string())
            .bind(event.token_id.as_str())
            .bind(event.price.to_string())
            .bind(params.address.to_string())
            .bind(to_sql_int(params.block)?)
            .bind(params.block_hash.map(|h| h.to_string()))
            .bind(i64::from(params.tx_index))
            .bind(params.timestamp)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }

        tx.commit().await?;
        debug!(received = records.len(), inserted, "Stored fill records");
        Ok(inserted)
    }

    /// Load the fills of a transaction, grouped per emitting log in log order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row no longer decodes.
    pub async fn query_on_chain_data(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Vec<OnChainData>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT tx_hash, log_index, batch_index, variant, order_kind, contract,
                   token_id, price, address, block, block_hash, tx_index, timestamp
            FROM fill_events
            WHERE tx_hash = ?
            ORDER BY log_index ASC, batch_index ASC
            "#,
        )
        .bind(tx_hash.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut logs: Vec<(u32, OnChainData)> = Vec::new();
        for row in &rows {
            let record = fill_record_from_row(row)?;
            let log_index = record.event.base_event_params.log_index;
            match logs.last_mut() {
                Some((last, data)) if *last == log_index => data.fills.push(record),
                _ => logs.push((log_index, OnChainData::new(vec![record]))),
            }
        }

        Ok(logs.into_iter().map(|(_, data)| data).collect())
    }
}

fn fill_record_from_row(row: &SqliteRow) -> Result<FillRecord, sqlx::Error> {
    let variant_str: String = row.try_get("variant")?;
    let variant = FillVariant::parse(&variant_str).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "variant".to_string(),
        source: format!("unknown fill variant {:?}", variant_str).into(),
    })?;

    let block_hash = match row.try_get::<Option<String>, _>("block_hash")? {
        Some(_) => Some(parse_column::<TxHash>(row, "block_hash")?),
        None => None,
    };

    let event = FillEvent {
        order_kind: OrderKind::new(row.try_get("order_kind")?),
        contract: parse_column(row, "contract")?,
        token_id: TokenId::new(row.try_get("token_id")?),
        price: parse_column(row, "price")?,
        base_event_params: BaseEventParams {
            address: parse_column(row, "address")?,
            block: int_column(row, "block")?,
            block_hash,
            tx_hash: parse_column(row, "tx_hash")?,
            tx_index: int_column(row, "tx_index")?,
            log_index: int_column(row, "log_index")?,
            batch_index: int_column(row, "batch_index")?,
            timestamp: row.try_get("timestamp")?,
        },
    };

    Ok(FillRecord::new(variant, event))
}

#[async_trait]
impl FillEventSource for Repository {
    async fn fetch_on_chain_data(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Vec<OnChainData>, DataSourceError> {
        Ok(self.query_on_chain_data(tx_hash).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::domain::{Address, Wei};
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

    fn tx() -> TxHash {
        format!("0x{}", "ab".repeat(32)).parse().unwrap()
    }

    fn record(variant: FillVariant, log_index: u32, batch_index: u32, price: u128) -> FillRecord {
        FillRecord::new(
            variant,
            FillEvent {
                order_kind: OrderKind::new("seaport".to_string()),
                contract: Address::repeat_byte(0xcc),
                token_id: TokenId::new(format!("{}", log_index * 10 + batch_index)),
                price: Wei::from_u128(price),
                base_event_params: BaseEventParams {
                    address: Address::repeat_byte(0xee),
                    block: 17_000_000,
                    block_hash: Some(format!("0x{}", "0f".repeat(32)).parse().unwrap()),
                    tx_hash: tx(),
                    tx_index: 3,
                    log_index,
                    batch_index,
                    timestamp: 1_690_000_000,
                },
            },
        )
    }

    #[tokio::test]
    async fn test_insert_and_group_by_log() {
        let (repo, _temp) = setup_test_db().await;
        let records = vec![
            record(FillVariant::OnChain, 9, 0, 5),
            record(FillVariant::Confirmed, 4, 1, 2),
            record(FillVariant::Partial, 4, 0, 1),
        ];
        assert_eq!(repo.insert_fill_records(&records).await.unwrap(), 3);

        let data = repo.query_on_chain_data(&tx()).await.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].fills, vec![records[2].clone(), records[1].clone()]);
        assert_eq!(data[1].fills, vec![records[0].clone()]);
    }

    #[tokio::test]
    async fn test_insert_is_idempotent() {
        let (repo, _temp) = setup_test_db().await;
        let records = vec![record(FillVariant::Confirmed, 1, 0, 100)];
        assert_eq!(repo.insert_fill_records(&records).await.unwrap(), 1);
        assert_eq!(repo.insert_fill_records(&records).await.unwrap(), 0);
        assert_eq!(repo.query_on_chain_data(&tx()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_large_price_survives_storage() {
        let (repo, _temp) = setup_test_db().await;
        let mut big = record(FillVariant::Confirmed, 0, 0, 0);
        big.event.price = "123456789012345678901234567890123456789".parse().unwrap();
        repo.insert_fill_records(std::slice::from_ref(&big)).await.unwrap();

        let data = repo.fetch_on_chain_data(&tx()).await.unwrap();
        assert_eq!(data[0].fills[0].event.price, big.event.price);
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_empty() {
        let (repo, _temp) = setup_test_db().await;
        assert!(repo.query_on_chain_data(&tx()).await.unwrap().is_empty());
    }
}
