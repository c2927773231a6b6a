//! The backfill control flow: validate the window, fetch, write, report.

use chrono::Duration;
use serde::Serialize;
use tracing::info;

use crate::candles::CandleStore;
use crate::error::ServiceError;
use crate::fetch::CandleFetcher;
use crate::timeframe::{validate_window, Timeframe};

/// Outcome of one backfill call.
#[derive(Debug, Clone, Serialize)]
pub struct BackfillReport {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub fetched: usize,
    pub written: u64,
}

/// Runs one validate -> fetch -> write sequence for a symbol/timeframe.
///
/// The window check runs first, so an out-of-range request never reaches
/// the upstream source. An empty fetch result is not an error; it writes
/// nothing and reports zero. Concurrent calls for the same pair are safe
/// because the store's unique key makes the write idempotent.
pub async fn backfill_candles(
    fetcher: &dyn CandleFetcher,
    store: &CandleStore,
    symbol: &str,
    timeframe: Timeframe,
    period: Duration,
) -> Result<BackfillReport, ServiceError> {
    let period = validate_window(timeframe, period)?;

    let candles = fetcher.fetch(symbol, timeframe, period).await?;
    let written = store.write_batch(&candles).await?;

    info!(
        symbol = symbol,
        timeframe = %timeframe,
        fetched = candles.len(),
        written = written,
        "backfill complete"
    );

    Ok(BackfillReport {
        symbol: symbol.to_string(),
        timeframe,
        fetched: candles.len(),
        written,
    })
}
