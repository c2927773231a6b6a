//! Intraday timeframes and the backfill window policy.
//!
//! Yahoo caps how far back each intraday interval can be requested, so the
//! window validator runs before any fetch: 1m data is available for 7 days,
//! 2m through 30m for 60 days, 60m for 730 days.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Supported intraday bar sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "2m")]
    M2,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "60m")]
    M60,
}

impl Timeframe {
    pub const ALL: [Timeframe; 6] = [
        Timeframe::M1,
        Timeframe::M2,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::M60,
    ];

    /// Wire and storage representation, also the upstream interval string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M2 => "2m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::M60 => "60m",
        }
    }

    /// Longest lookback the upstream source serves for this bar size.
    pub fn max_period(&self) -> Duration {
        match self {
            Timeframe::M1 => Duration::days(7),
            Timeframe::M2 | Timeframe::M5 | Timeframe::M15 | Timeframe::M30 => Duration::days(60),
            Timeframe::M60 => Duration::days(730),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Timeframe::M1),
            "2m" => Ok(Timeframe::M2),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "30m" => Ok(Timeframe::M30),
            "60m" => Ok(Timeframe::M60),
            other => Err(ServiceError::UnsupportedTimeframe(other.to_string())),
        }
    }
}

/// Parses a lookback period like `"7d"`, `"36h"`, `"90m"`; a bare number
/// counts days. Zero, negative and malformed input are rejected.
pub fn parse_period(s: &str) -> Result<Duration, ServiceError> {
    let raw = s.trim();
    let invalid = || ServiceError::InvalidPeriod(raw.to_string());

    if raw.is_empty() {
        return Err(invalid());
    }

    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], Some(c.to_ascii_lowercase())),
        _ => (raw, None),
    };

    let n: i64 = digits.trim().parse().map_err(|_| invalid())?;
    if n <= 0 {
        return Err(invalid());
    }

    let period = match unit {
        None | Some('d') => Duration::try_days(n),
        Some('h') => Duration::try_hours(n),
        Some('m') => Duration::try_minutes(n),
        Some(_) => return Err(invalid()),
    };
    period.ok_or_else(invalid)
}

/// Checks a requested backfill window against the timeframe's cap.
///
/// Returns the period unchanged when it fits. Out-of-range requests are
/// rejected outright, never clamped.
pub fn validate_window(timeframe: Timeframe, period: Duration) -> Result<Duration, ServiceError> {
    if period <= Duration::zero() {
        return Err(ServiceError::InvalidPeriod(fmt_duration(&period)));
    }
    let max = timeframe.max_period();
    if period > max {
        return Err(ServiceError::OutOfRange {
            timeframe,
            requested: period,
            max,
        });
    }
    Ok(period)
}

/// Renders a period in the same shape `parse_period` accepts.
pub fn fmt_duration(d: &Duration) -> String {
    let secs = d.num_seconds();
    if secs != 0 && secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs != 0 && secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}m", secs / 60)
    }
}
