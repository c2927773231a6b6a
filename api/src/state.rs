use std::sync::Arc;

use sea_orm::DatabaseConnection;
use shared::{CandleFetcher, CandleStore, Config, DbPool, TradingFlag};

/// Shared application state, handed to every handler via `axum::extract::State`.
pub struct AppState {
    pub config: Config,
    /// sqlx pool for the aggregate report queries and the health ping.
    pub pool: DbPool,
    pub store: CandleStore,
    pub fetcher: Arc<dyn CandleFetcher>,
    pub trading: TradingFlag,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: DbPool,
        db: DatabaseConnection,
        fetcher: Arc<dyn CandleFetcher>,
    ) -> Arc<Self> {
        Arc::new(AppState {
            config,
            pool,
            store: CandleStore::new(db),
            fetcher,
            trading: TradingFlag::default(),
        })
    }
}
