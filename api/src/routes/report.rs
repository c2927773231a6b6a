//! Canned aggregate reports over the candles table.
//!
//! Only the allow-listed report types below exist; every filter value is
//! bound as a parameter through `QueryBuilder`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{DbPool, Timeframe};
use sqlx::{FromRow, MySql, QueryBuilder};

use crate::auth::{check_key, header_key};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/report", post(report))
}

#[derive(Debug, Deserialize)]
pub struct ReportBody {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_days")]
    days: i64,
    symbol: Option<String>,
    tf: Option<String>,
}

fn default_days() -> i64 {
    10
}

/// Bar count and time span per (symbol, timeframe).
#[derive(Debug, Serialize, FromRow)]
struct CoverageRow {
    symbol: String,
    timeframe: String,
    bars: i64,
    first_ts: Option<DateTime<Utc>>,
    latest_ts: Option<DateTime<Utc>>,
}

/// Bars stored per calendar day for one symbol/timeframe.
#[derive(Debug, Serialize, FromRow)]
struct DailyRow {
    day: NaiveDate,
    bars: i64,
}

/// Widest high-low bars in the window.
#[derive(Debug, Serialize, FromRow)]
struct RangeRow {
    ts_utc: DateTime<Utc>,
    symbol: String,
    timeframe: String,
    bar_range: f64,
    volume: u64,
}

async fn report(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ReportBody>,
) -> Result<Json<Value>, ApiError> {
    check_key(state.config.api_key.as_deref(), header_key(&headers))?;

    if !(1..=365).contains(&body.days) {
        return Err(ApiError::BadRequest(
            "days must be between 1 and 365".to_string(),
        ));
    }
    let cutoff = Utc::now() - Duration::days(body.days);

    let rows: Value = match body.kind.as_str() {
        "coverage" => json!(coverage_rows(&state.pool, body.symbol.as_deref()).await?),
        "daily" => json!(daily_rows(&state.pool, &body, cutoff).await?),
        "top_ranges" => json!(top_range_rows(&state.pool, &body, cutoff).await?),
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown report type '{}'",
                other
            )))
        }
    };

    Ok(Json(json!({ "ok": true, "type": body.kind, "rows": rows })))
}

async fn coverage_rows(pool: &DbPool, symbol: Option<&str>) -> Result<Vec<CoverageRow>, ApiError> {
    let mut qb = QueryBuilder::<MySql>::new(
        "SELECT symbol, timeframe, COUNT(*) AS bars, \
         MIN(ts_utc) AS first_ts, MAX(ts_utc) AS latest_ts FROM candles",
    );
    if let Some(symbol) = symbol {
        qb.push(" WHERE symbol = ").push_bind(symbol);
    }
    qb.push(" GROUP BY symbol, timeframe ORDER BY symbol, timeframe");

    Ok(qb.build_query_as::<CoverageRow>().fetch_all(pool).await?)
}

async fn daily_rows(
    pool: &DbPool,
    body: &ReportBody,
    cutoff: DateTime<Utc>,
) -> Result<Vec<DailyRow>, ApiError> {
    let symbol = body
        .symbol
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("daily report needs a symbol".to_string()))?;
    let tf: Timeframe = body
        .tf
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("daily report needs a tf".to_string()))?
        .parse()?;

    let rows = sqlx::query_as::<_, DailyRow>(
        "SELECT DATE(ts_utc) AS day, COUNT(*) AS bars FROM candles \
         WHERE symbol = ? AND timeframe = ? AND ts_utc >= ? \
         GROUP BY DATE(ts_utc) ORDER BY day",
    )
    .bind(symbol)
    .bind(tf.as_str())
    .bind(cutoff)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

async fn top_range_rows(
    pool: &DbPool,
    body: &ReportBody,
    cutoff: DateTime<Utc>,
) -> Result<Vec<RangeRow>, ApiError> {
    let mut qb = QueryBuilder::<MySql>::new(
        "SELECT ts_utc, symbol, timeframe, \
         CAST(high - low AS DOUBLE) AS bar_range, volume FROM candles WHERE ts_utc >= ",
    );
    qb.push_bind(cutoff);
    if let Some(symbol) = body.symbol.as_deref() {
        qb.push(" AND symbol = ").push_bind(symbol);
    }
    if let Some(tf) = body.tf.as_deref() {
        let tf: Timeframe = tf.parse()?;
        qb.push(" AND timeframe = ").push_bind(tf.as_str());
    }
    qb.push(" ORDER BY bar_range DESC LIMIT 100");

    Ok(qb.build_query_as::<RangeRow>().fetch_all(pool).await?)
}
