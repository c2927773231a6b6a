//! Upstream candle source.
//!
//! `YahooFetcher` pulls OHLCV history from Yahoo Finance. The trait exists so
//! the backfill path and the API can run against a canned source in tests.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api::{Quote, YahooConnector};

use crate::error::ServiceError;
use crate::models::Candle;
use crate::timeframe::Timeframe;

#[async_trait]
pub trait CandleFetcher: Send + Sync {
    /// Fetches bars for the window `[now - period, now]`.
    ///
    /// An empty vec means the upstream had no data for the window and is
    /// not an error; upstream failures come back as `ServiceError::Fetch`.
    /// No retries happen here.
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        period: Duration,
    ) -> Result<Vec<Candle>, ServiceError>;
}

pub struct YahooFetcher {
    connector: YahooConnector,
}

impl YahooFetcher {
    pub fn new() -> Result<Self, ServiceError> {
        let connector = YahooConnector::new()
            .map_err(|e| ServiceError::Fetch(format!("Yahoo connector init: {}", e)))?;
        Ok(YahooFetcher { connector })
    }
}

#[async_trait]
impl CandleFetcher for YahooFetcher {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        period: Duration,
    ) -> Result<Vec<Candle>, ServiceError> {
        let upstream = yahoo_symbol(symbol);
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::seconds(period.num_seconds());

        debug!(symbol = %upstream, interval = timeframe.as_str(), "requesting quote history");

        let response = self
            .connector
            .get_quote_history_interval(&upstream, start, end, timeframe.as_str())
            .await
            .map_err(|e| ServiceError::Fetch(format!("{} {}: {}", upstream, timeframe, e)))?;

        let quotes = response
            .quotes()
            .map_err(|e| ServiceError::Fetch(format!("{} {}: quote decode: {}", upstream, timeframe, e)))?;

        Ok(quotes_to_candles(symbol, timeframe, &quotes))
    }
}

/// Yahoo lists futures roots under a `=F` suffix. The stored symbol stays
/// canonical; the alias only exists on the wire to Yahoo.
pub fn yahoo_symbol(symbol: &str) -> String {
    match symbol {
        "ES" => "ES=F".to_string(),
        "NQ" => "NQ=F".to_string(),
        "YM" => "YM=F".to_string(),
        other => other.to_string(),
    }
}

/// Converts raw quotes into candles, sorted by open time. Bars whose prices
/// do not survive the f64 to Decimal conversion (NaN gaps) are dropped.
fn quotes_to_candles(symbol: &str, timeframe: Timeframe, quotes: &[Quote]) -> Vec<Candle> {
    let mut candles: Vec<Candle> = quotes
        .iter()
        .filter_map(|q| {
            let ts_utc = Utc.timestamp_opt(q.timestamp as i64, 0).single()?;
            Some(Candle {
                symbol: symbol.to_string(),
                timeframe,
                ts_utc,
                open: Decimal::from_f64_retain(q.open)?,
                high: Decimal::from_f64_retain(q.high)?,
                low: Decimal::from_f64_retain(q.low)?,
                close: Decimal::from_f64_retain(q.close)?,
                volume: q.volume,
            })
        })
        .collect();
    candles.sort_by_key(|c| c.ts_utc);
    candles
}
