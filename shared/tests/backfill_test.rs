//! Backfill control flow against a canned fetcher and a mock database.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use shared::{backfill_candles, Candle, CandleFetcher, CandleStore, ServiceError, Timeframe};

struct CannedFetcher {
    candles: Vec<Candle>,
    calls: AtomicUsize,
}

impl CannedFetcher {
    fn with(candles: Vec<Candle>) -> Self {
        CannedFetcher {
            candles,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CandleFetcher for CannedFetcher {
    async fn fetch(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        _period: Duration,
    ) -> Result<Vec<Candle>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.candles.clone())
    }
}

struct FailingFetcher;

#[async_trait]
impl CandleFetcher for FailingFetcher {
    async fn fetch(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        _period: Duration,
    ) -> Result<Vec<Candle>, ServiceError> {
        Err(ServiceError::Fetch("rate limited".to_string()))
    }
}

fn candle(ts: i64) -> Candle {
    Candle {
        symbol: "AAPL".to_string(),
        timeframe: Timeframe::M60,
        ts_utc: Utc.timestamp_opt(ts, 0).unwrap(),
        open: Decimal::new(19500, 2),
        high: Decimal::new(19620, 2),
        low: Decimal::new(19480, 2),
        close: Decimal::new(19600, 2),
        volume: 5000,
    }
}

fn empty_store() -> CandleStore {
    CandleStore::new(MockDatabase::new(DatabaseBackend::MySql).into_connection())
}

#[tokio::test]
async fn test_out_of_range_request_never_reaches_the_fetcher() {
    let fetcher = CannedFetcher::with(vec![candle(1_700_000_000)]);
    let store = empty_store();

    let err = backfill_candles(&fetcher, &store, "ES", Timeframe::M1, Duration::days(10))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::OutOfRange { max, .. } if max == Duration::days(7)));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_fetch_writes_nothing() {
    let fetcher = CannedFetcher::with(vec![]);
    // nothing scripted: a write would fail the call
    let store = empty_store();

    let report = backfill_candles(&fetcher, &store, "ES", Timeframe::M5, Duration::days(5))
        .await
        .unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(report.written, 0);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetched_candles_are_written_and_counted() {
    let fetcher = CannedFetcher::with(vec![
        candle(1_700_000_000),
        candle(1_700_003_600),
        candle(1_700_007_200),
    ]);
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([MockExecResult {
            last_insert_id: 3,
            rows_affected: 3,
        }])
        .into_connection();
    let store = CandleStore::new(db);

    let report = backfill_candles(&fetcher, &store, "AAPL", Timeframe::M60, Duration::days(30))
        .await
        .unwrap();

    assert_eq!(report.symbol, "AAPL");
    assert_eq!(report.timeframe, Timeframe::M60);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.written, 3);
}

#[tokio::test]
async fn test_fetch_failure_propagates() {
    let store = empty_store();

    let err = backfill_candles(&FailingFetcher, &store, "NQ", Timeframe::M15, Duration::days(1))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Fetch(msg) if msg.contains("rate limited")));
}
