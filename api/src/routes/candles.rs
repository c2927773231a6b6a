//! Candle reads and the backfill trigger.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::{backfill_candles, parse_period, Timeframe};

use crate::auth::{check_key, header_key};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/candles/status", get(candles_status))
        .route("/candles/latest", get(candles_latest))
        .route("/candles/recent", get(candles_recent))
        .route("/candles/count", get(candles_count))
        .route("/backfill", post(backfill))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    symbol: Option<String>,
    tf: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BarsQuery {
    symbol: String,
    tf: String,
    #[serde(default = "default_limit")]
    limit: u64,
}

fn default_limit() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    symbol: String,
    tf: String,
    #[serde(default = "default_since")]
    since: String,
}

fn default_since() -> String {
    "1h".to_string()
}

#[derive(Debug, Deserialize)]
pub struct BackfillBody {
    symbol: String,
    timeframe: String,
    period: String,
}

async fn candles_status(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StatusQuery>,
) -> Result<Json<Value>, ApiError> {
    let tf = match q.tf.as_deref() {
        Some(s) => Some(s.parse::<Timeframe>()?),
        None => None,
    };
    let status = state.store.status(q.symbol.as_deref(), tf).await?;
    Ok(Json(json!({
        "ok": true,
        "count": status.count,
        "latest": status.latest,
    })))
}

async fn candles_latest(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BarsQuery>,
) -> Result<Json<Value>, ApiError> {
    let tf: Timeframe = q.tf.parse()?;
    let row = state.store.latest(&q.symbol, tf).await?;
    let rows: Vec<_> = row.into_iter().collect();
    Ok(Json(json!({ "ok": true, "rows": rows })))
}

async fn candles_recent(
    State(state): State<Arc<AppState>>,
    Query(q): Query<BarsQuery>,
) -> Result<Json<Value>, ApiError> {
    let tf: Timeframe = q.tf.parse()?;
    let limit = q.limit.clamp(1, 100);
    let rows = state.store.recent(&q.symbol, tf, limit).await?;
    Ok(Json(json!({ "ok": true, "rows": rows })))
}

async fn candles_count(
    State(state): State<Arc<AppState>>,
    Query(q): Query<CountQuery>,
) -> Result<Json<Value>, ApiError> {
    let tf: Timeframe = q.tf.parse()?;
    // cutoff is computed here and bound as a parameter, never spliced into SQL
    let since = parse_period(&q.since)?;
    let cutoff = Utc::now() - since;
    let count = state.store.count_since(&q.symbol, tf, cutoff).await?;
    Ok(Json(json!({
        "ok": true,
        "symbol": q.symbol,
        "tf": tf,
        "since": q.since,
        "count": count,
    })))
}

async fn backfill(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<BackfillBody>,
) -> Result<Json<Value>, ApiError> {
    check_key(state.config.api_key.as_deref(), header_key(&headers))?;

    let tf: Timeframe = body.timeframe.parse()?;
    let period = parse_period(&body.period)?;

    let report =
        backfill_candles(state.fetcher.as_ref(), &state.store, &body.symbol, tf, period).await?;

    Ok(Json(json!({
        "ok": true,
        "symbol": report.symbol,
        "timeframe": report.timeframe,
        "fetched": report.fetched,
        "written": report.written,
    })))
}
