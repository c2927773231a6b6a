use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use tracing::info;

/// Connection ceiling for each handle; the report queries are the only
/// fan-out consumers, so a small pool is plenty.
const MAX_CONNECTIONS: u32 = 10;

/// Plain sqlx pool, used for the aggregate report queries and the
/// health-check ping. The URL is deliberately kept out of the logs.
pub async fn get_pool(database_url: &str) -> Result<MySqlPool> {
    let pool = MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await?;
    info!("Connected to database (sqlx pool)");
    Ok(pool)
}

/// Sea-ORM handle for entity reads and the candle upsert path.
pub async fn get_db_connection(database_url: &str) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(MAX_CONNECTIONS);
    let db = Database::connect(opt).await?;
    info!("Connected to database (Sea-ORM)");
    Ok(db)
}

pub type DbPool = MySqlPool;
