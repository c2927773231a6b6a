pub mod backfill;
pub mod candles;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod models;
pub mod timeframe;

pub use backfill::{backfill_candles, BackfillReport};
pub use candles::CandleStore;
pub use config::Config;
pub use database::{get_pool, get_db_connection, DbPool};
pub use error::ServiceError;
pub use fetch::{CandleFetcher, YahooFetcher};
pub use models::*;
pub use timeframe::{Timeframe, parse_period, validate_window};
