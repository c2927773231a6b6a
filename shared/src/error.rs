use chrono::Duration;
use thiserror::Error;

use crate::timeframe::{fmt_duration, Timeframe};

/// Failures surfaced by the candle and control services.
///
/// Every variant maps to a caller-visible failure; nothing here is
/// fatal to the process. See `api::error` for the HTTP status mapping.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unsupported timeframe '{0}', expected one of 1m, 2m, 5m, 15m, 30m, 60m")]
    UnsupportedTimeframe(String),

    #[error("invalid period '{0}', expected a positive duration like 7d, 24h or 90m")]
    InvalidPeriod(String),

    #[error("period {} exceeds the maximum of {} for timeframe {timeframe}", fmt_duration(.requested), fmt_duration(.max))]
    OutOfRange {
        timeframe: Timeframe,
        requested: Duration,
        max: Duration,
    },

    #[error("upstream fetch failed: {0}")]
    Fetch(String),

    #[error("storage error: {0}")]
    Persistence(#[from] sea_orm::DbErr),

    #[error("unauthorized")]
    Unauthorized,

    #[error("API key is not configured")]
    Misconfigured,
}
