//! Candle persistence over the `candles` table.
//!
//! Writes go through a keyed upsert: the unique index on
//! (symbol, timeframe, ts_utc) makes re-ingesting a window idempotent,
//! and each batch runs inside a single transaction so a failed call
//! leaves nothing behind.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use crate::entity::candles;
use crate::error::ServiceError;
use crate::models::{Candle, CandleStatus};
use crate::timeframe::Timeframe;

/// Rows per INSERT statement inside a batch transaction.
const INSERT_CHUNK: usize = 500;

pub struct CandleStore {
    db: DatabaseConnection,
}

#[derive(FromQueryResult)]
struct StatusRow {
    count: i64,
    latest: Option<DateTime<Utc>>,
}

impl CandleStore {
    pub fn new(db: DatabaseConnection) -> Self {
        CandleStore { db }
    }

    /// Upserts a batch of candles and returns how many the call persisted.
    ///
    /// All-or-nothing: every chunk runs on one transaction, committed only
    /// after the whole batch went through. Conflicting rows get their OHLCV
    /// columns overwritten, never duplicated. An empty batch is a no-op.
    pub async fn write_batch(&self, batch: &[Candle]) -> Result<u64, ServiceError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        for chunk in batch.chunks(INSERT_CHUNK) {
            candles::Entity::insert_many(chunk.iter().map(to_active_model))
                .on_conflict(
                    OnConflict::columns([
                        candles::Column::Symbol,
                        candles::Column::Timeframe,
                        candles::Column::TsUtc,
                    ])
                    .update_columns([
                        candles::Column::Open,
                        candles::Column::High,
                        candles::Column::Low,
                        candles::Column::Close,
                        candles::Column::Volume,
                    ])
                    .to_owned(),
                )
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        Ok(batch.len() as u64)
    }

    /// Row count and newest open time for the selection. Empty selections
    /// answer with a zero count, not an error.
    pub async fn status(
        &self,
        symbol: Option<&str>,
        timeframe: Option<Timeframe>,
    ) -> Result<CandleStatus, ServiceError> {
        let mut query = candles::Entity::find()
            .select_only()
            .column_as(candles::Column::Id.count(), "count")
            .column_as(candles::Column::TsUtc.max(), "latest");
        if let Some(symbol) = symbol {
            query = query.filter(candles::Column::Symbol.eq(symbol));
        }
        if let Some(tf) = timeframe {
            query = query.filter(candles::Column::Timeframe.eq(tf.as_str()));
        }

        let row = query.into_model::<StatusRow>().one(&self.db).await?;
        Ok(match row {
            Some(r) => CandleStatus {
                count: r.count.max(0) as u64,
                latest: r.latest,
            },
            None => CandleStatus { count: 0, latest: None },
        })
    }

    /// Newest stored bar for one symbol/timeframe, if any.
    pub async fn latest(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Option<candles::Model>, ServiceError> {
        let row = candles::Entity::find()
            .filter(candles::Column::Symbol.eq(symbol))
            .filter(candles::Column::Timeframe.eq(timeframe.as_str()))
            .order_by(candles::Column::TsUtc, Order::Desc)
            .one(&self.db)
            .await?;
        Ok(row)
    }

    /// Most recent bars, newest first.
    pub async fn recent(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u64,
    ) -> Result<Vec<candles::Model>, ServiceError> {
        let rows = candles::Entity::find()
            .filter(candles::Column::Symbol.eq(symbol))
            .filter(candles::Column::Timeframe.eq(timeframe.as_str()))
            .order_by(candles::Column::TsUtc, Order::Desc)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows)
    }

    /// Bars at or after the cutoff. The cutoff is computed by the caller
    /// and bound as a query parameter.
    pub async fn count_since(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, ServiceError> {
        let n = candles::Entity::find()
            .filter(candles::Column::Symbol.eq(symbol))
            .filter(candles::Column::Timeframe.eq(timeframe.as_str()))
            .filter(candles::Column::TsUtc.gte(cutoff))
            .count(&self.db)
            .await?;
        Ok(n)
    }
}

fn to_active_model(c: &Candle) -> candles::ActiveModel {
    candles::ActiveModel {
        symbol: ActiveValue::Set(c.symbol.clone()),
        timeframe: ActiveValue::Set(c.timeframe.as_str().to_string()),
        ts_utc: ActiveValue::Set(c.ts_utc),
        open: ActiveValue::Set(c.open),
        high: ActiveValue::Set(c.high),
        low: ActiveValue::Set(c.low),
        close: ActiveValue::Set(c.close),
        volume: ActiveValue::Set(c.volume),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn candle(ts: i64) -> Candle {
        Candle {
            symbol: "ES".to_string(),
            timeframe: Timeframe::M5,
            ts_utc: Utc.timestamp_opt(ts, 0).unwrap(),
            open: Decimal::new(500025, 2),
            high: Decimal::new(500150, 2),
            low: Decimal::new(499900, 2),
            close: Decimal::new(500100, 2),
            volume: 100,
        }
    }

    #[tokio::test]
    async fn test_write_batch_empty_is_a_noop() {
        // nothing scripted: touching the database would fail the call
        let db = MockDatabase::new(DatabaseBackend::MySql).into_connection();
        let store = CandleStore::new(db);

        let written = store.write_batch(&[]).await.unwrap();
        assert_eq!(written, 0);
    }

    #[tokio::test]
    async fn test_write_batch_returns_batch_len() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([MockExecResult {
                last_insert_id: 3,
                rows_affected: 3,
            }])
            .into_connection();
        let store = CandleStore::new(db);

        let batch = vec![candle(1_700_000_000), candle(1_700_000_300), candle(1_700_000_600)];
        let written = store.write_batch(&batch).await.unwrap();
        assert_eq!(written, 3);
    }

    #[tokio::test]
    async fn test_write_batch_chunks_large_batches() {
        // 1200 candles make three INSERTs on one transaction
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([
                MockExecResult { last_insert_id: 500, rows_affected: 500 },
                MockExecResult { last_insert_id: 1000, rows_affected: 500 },
                MockExecResult { last_insert_id: 1200, rows_affected: 200 },
            ])
            .into_connection();
        let store = CandleStore::new(db);

        let batch: Vec<Candle> = (0..1200).map(|i| candle(1_700_000_000 + i * 300)).collect();
        let written = store.write_batch(&batch).await.unwrap();
        assert_eq!(written, 1200);
    }

    #[tokio::test]
    async fn test_write_batch_renders_a_keyed_upsert() {
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_exec_results([MockExecResult {
                last_insert_id: 1,
                rows_affected: 3,
            }])
            .into_connection();
        let store = CandleStore::new(db);

        // two rows on the same (symbol, timeframe, ts_utc) key: the statement
        // must overwrite OHLCV on conflict instead of inserting a duplicate
        let batch = vec![candle(1_700_000_000), candle(1_700_000_000)];
        let written = store.write_batch(&batch).await.unwrap();
        assert_eq!(written, 2);

        let log = format!("{:?}", store.db.into_transaction_log());
        assert!(log.contains("ON DUPLICATE KEY UPDATE"), "{}", log);
        for col in ["open", "high", "low", "close", "volume"] {
            let clause = format!("`{}` = VALUES(`{}`)", col, col);
            assert!(log.contains(&clause), "missing {}: {}", clause, log);
        }
    }

    #[tokio::test]
    async fn test_status_zero_value_when_nothing_matches() {
        let empty: Vec<BTreeMap<&str, Value>> = vec![];
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([empty])
            .into_connection();
        let store = CandleStore::new(db);

        let status = store.status(None, None).await.unwrap();
        assert_eq!(status.count, 0);
        assert!(status.latest.is_none());
    }

    #[tokio::test]
    async fn test_status_decodes_count_and_latest() {
        let latest = Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap();
        let row = BTreeMap::from([
            ("count", Value::from(3i64)),
            ("latest", Value::from(latest)),
        ]);
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![row]])
            .into_connection();
        let store = CandleStore::new(db);

        let status = store.status(Some("AAPL"), Some(Timeframe::M60)).await.unwrap();
        assert_eq!(status.count, 3);
        assert_eq!(status.latest, Some(latest));
    }

    #[tokio::test]
    async fn test_latest_decodes_entity_row() {
        let model = candles::Model {
            id: 7,
            symbol: "ES".to_string(),
            timeframe: "5m".to_string(),
            ts_utc: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            open: Decimal::new(500025, 2),
            high: Decimal::new(500150, 2),
            low: Decimal::new(499900, 2),
            close: Decimal::new(500100, 2),
            volume: 100,
            created_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![model.clone()]])
            .into_connection();
        let store = CandleStore::new(db);

        let got = store.latest("ES", Timeframe::M5).await.unwrap();
        assert_eq!(got, Some(model));
    }

    #[tokio::test]
    async fn test_count_since_decodes_count() {
        // the paginator reads num_items as an i32 on MySQL
        let row = BTreeMap::from([("num_items", Value::from(42i32))]);
        let db = MockDatabase::new(DatabaseBackend::MySql)
            .append_query_results([vec![row]])
            .into_connection();
        let store = CandleStore::new(db);

        let cutoff = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let n = store.count_since("ES", Timeframe::M5, cutoff).await.unwrap();
        assert_eq!(n, 42);
    }
}
