//! Repository layer for database operations.
//!
//! Methods are organized across submodules by table:
//! - `fills.rs` - reconstructed fill events
//! - `royalties.rs` - configured collection royalties
//! - `reports.rs` - stored attribution reports

mod fills;
mod reports;
mod royalties;

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Round-trip a trivial query to confirm the database is reachable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Read a text column and parse it into a domain type.
fn parse_column<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Read an integer column into a narrower or unsigned integer type.
fn int_column<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: TryFrom<i64>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let raw: i64 = row.try_get(column)?;
    T::try_from(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn to_sql_int(value: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(value)
        .map_err(|e| sqlx::Error::Protocol(format!("integer {} out of SQLite range: {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sql_int_range() {
        assert_eq!(to_sql_int(42).unwrap(), 42);
        assert_eq!(to_sql_int(i64::MAX as u64).unwrap(), i64::MAX);
        assert!(matches!(to_sql_int(u64::MAX), Err(sqlx::Error::Protocol(_))));
    }
}
