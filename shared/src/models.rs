use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::timeframe::Timeframe;

/// One OHLCV bar as fetched from upstream, keyed by
/// (symbol, timeframe, open time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub ts_utc: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// Aggregate view over stored candles. A zero count with no latest
/// timestamp is the normal answer for an empty selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleStatus {
    pub count: u64,
    pub latest: Option<DateTime<Utc>>,
}

/// Process-wide trading on/off switch.
///
/// Defaults to enabled and is not persisted; a restart brings trading
/// back up. Cloning shares the underlying flag.
#[derive(Debug, Clone)]
pub struct TradingFlag(Arc<AtomicBool>);

impl TradingFlag {
    pub fn new(enabled: bool) -> Self {
        TradingFlag(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn enable(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl Default for TradingFlag {
    fn default() -> Self {
        TradingFlag::new(true)
    }
}
