use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use migration::{Migrator, MigratorTrait};
use serde_json::{json, Value};
use shared::{get_db_connection, get_pool, Config, YahooFetcher};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod auth;
mod error;
mod routes;
mod state;

use error::ApiError;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting trading control API server...");

    let config = Config::from_env()?;
    let pool = get_pool(&config.database_url).await?;
    let db = get_db_connection(&config.database_url).await?;

    Migrator::up(&db, None).await?;
    info!("Migrations applied");

    let fetcher = Arc::new(YahooFetcher::new()?);
    let port = config.listen_port;
    let state = AppState::new(config, pool, db, fetcher);

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(routes::control::routes())
        .merge(routes::candles::routes())
        .merge(routes::report::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": "trading-control",
        "routes": [
            "/health",
            "/control-panel",
            "/control",
            "/control/get",
            "/candles/status",
            "/candles/latest",
            "/candles/recent",
            "/candles/count",
            "/backfill",
            "/report",
        ],
    }))
}

/// Liveness plus a database round trip; a dead database turns this
/// endpoint into a 500.
async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let db_time: chrono::NaiveDateTime = sqlx::query_scalar("SELECT NOW()")
        .fetch_one(&state.pool)
        .await?;
    Ok(Json(json!({
        "ok": true,
        "service": "trading-control",
        "db_time": db_time,
        "trading_enabled": state.trading.is_enabled(),
    })))
}
