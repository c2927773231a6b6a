//! Trading flag control: POST /control, GET /control/get and the HTML panel.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use shared::TradingFlag;
use tracing::info;

use crate::auth::{check_key, header_key};
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/control", post(control))
        .route("/control/get", get(control_get))
        .route("/control-panel", get(control_panel))
}

#[derive(Debug, Deserialize)]
pub struct ControlBody {
    action: String,
}

#[derive(Debug, Deserialize)]
pub struct ControlQuery {
    action: String,
    key: String,
}

async fn control(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ControlBody>,
) -> Result<Json<Value>, ApiError> {
    check_key(state.config.api_key.as_deref(), header_key(&headers))?;
    apply_action(&state.trading, &body.action)
}

/// Same contract as POST /control, for link-driven clients that can only
/// issue GETs; the key rides in the query string instead of a header.
async fn control_get(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ControlQuery>,
) -> Result<Json<Value>, ApiError> {
    check_key(state.config.api_key.as_deref(), Some(&q.key))?;
    apply_action(&state.trading, &q.action)
}

fn apply_action(flag: &TradingFlag, action: &str) -> Result<Json<Value>, ApiError> {
    match action {
        "start" => {
            flag.enable();
            info!(action = "start", "trading enabled");
        }
        "stop" => {
            flag.disable();
            info!(action = "stop", "trading disabled");
        }
        "status" => {}
        other => {
            return Err(ApiError::BadRequest(format!(
                "unknown action '{}', expected start, stop or status",
                other
            )))
        }
    }
    Ok(Json(json!({ "ok": true, "trading_enabled": flag.is_enabled() })))
}

async fn control_panel() -> Html<&'static str> {
    Html(PANEL_HTML)
}

const PANEL_HTML: &str = r##"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>Trading Control Panel</title>
<style>
  body { font-family: system-ui, sans-serif; background: #111; color: #eee; max-width: 640px; margin: 40px auto; padding: 0 16px; }
  h1 { font-size: 1.3rem; }
  button { font-size: 1rem; padding: 10px 18px; margin-right: 8px; border: 0; border-radius: 6px; cursor: pointer; }
  #start { background: #2e7d32; color: #fff; }
  #stop { background: #c62828; color: #fff; }
  #status { background: #455a64; color: #fff; }
  input { font-size: 1rem; padding: 8px; width: 100%; margin: 12px 0; background: #222; color: #eee; border: 1px solid #444; border-radius: 6px; box-sizing: border-box; }
  pre { background: #1b1b1b; padding: 12px; border-radius: 6px; overflow-x: auto; }
</style>
</head>
<body>
<h1>Trading Control Panel</h1>
<input id="key" type="password" placeholder="API key">
<div>
  <button id="start">Start</button>
  <button id="stop">Stop</button>
  <button id="status">Status</button>
</div>
<pre id="out">-</pre>
<script>
async function call(action) {
  const key = document.getElementById('key').value;
  const out = document.getElementById('out');
  try {
    const res = await fetch('/control', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json', 'X-API-Key': key },
      body: JSON.stringify({ action })
    });
    out.textContent = JSON.stringify(await res.json(), null, 2);
  } catch (e) {
    out.textContent = String(e);
  }
}
document.getElementById('start').onclick = () => call('start');
document.getElementById('stop').onclick = () => call('stop');
document.getElementById('status').onclick = () => call('status');
</script>
</body>
</html>
"##;
