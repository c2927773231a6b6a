//! Historical candle collector.
//!
//! Walks a symbols x timeframes grid and backfills each pair over the
//! requested period, pausing between upstream calls. Pair failures are
//! logged and skipped; the rest of the grid still runs.

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use shared::{
    backfill_candles, get_db_connection, parse_period, CandleStore, Config, Timeframe,
    YahooFetcher,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "collector", about = "Backfills OHLCV candles into the candles table")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and upsert candles for a symbols x timeframes grid
    Backfill(BackfillArgs),
    /// Print the stored candle count and newest timestamp
    Status(StatusArgs),
}

#[derive(Parser)]
struct BackfillArgs {
    /// Symbols to collect, comma separated (default: SYMBOLS env)
    #[arg(long, value_delimiter = ',')]
    symbols: Vec<String>,

    /// Timeframes to collect, comma separated (default: TIMEFRAMES env)
    #[arg(long, value_delimiter = ',')]
    timeframes: Vec<String>,

    /// Lookback period, e.g. 3d, 24h or 90m
    #[arg(long, default_value = "3d")]
    period: String,

    /// Pause between upstream calls in ms (default: FETCH_DELAY_MS env)
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[derive(Parser)]
struct StatusArgs {
    #[arg(long)]
    symbol: Option<String>,

    #[arg(long)]
    timeframe: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let db = get_db_connection(&config.database_url).await?;
    Migrator::up(&db, None).await?;
    let store = CandleStore::new(db);

    match cli.command {
        Commands::Backfill(args) => backfill(&config, &store, args).await,
        Commands::Status(args) => status(&store, args).await,
    }
}

async fn backfill(config: &Config, store: &CandleStore, args: BackfillArgs) -> Result<()> {
    let symbols = if args.symbols.is_empty() {
        config.symbols.clone()
    } else {
        args.symbols
    };
    let timeframes = if args.timeframes.is_empty() {
        config.timeframes.clone()
    } else {
        args.timeframes
    };
    let timeframes = timeframes
        .iter()
        .map(|s| Timeframe::from_str(s))
        .collect::<Result<Vec<_>, _>>()?;

    let period = parse_period(&args.period)?;
    let delay = Duration::from_millis(args.delay_ms.unwrap_or(config.fetch_delay_ms));
    let fetcher = YahooFetcher::new()?;

    info!(
        symbols = ?symbols,
        timeframes = ?timeframes,
        period = %args.period,
        "starting backfill run"
    );

    let mut written_total: u64 = 0;
    let mut failures: usize = 0;
    for symbol in &symbols {
        for timeframe in &timeframes {
            match backfill_candles(&fetcher, store, symbol, *timeframe, period).await {
                Ok(report) => written_total += report.written,
                Err(e) => {
                    failures += 1;
                    warn!(
                        symbol = symbol.as_str(),
                        timeframe = %timeframe,
                        error = %e,
                        "pair failed, moving on"
                    );
                }
            }
            tokio::time::sleep(delay).await;
        }
    }

    info!(written = written_total, failures = failures, "backfill run finished");
    Ok(())
}

async fn status(store: &CandleStore, args: StatusArgs) -> Result<()> {
    let timeframe = match args.timeframe.as_deref() {
        Some(s) => Some(Timeframe::from_str(s)?),
        None => None,
    };
    let status = store.status(args.symbol.as_deref(), timeframe).await?;
    match status.latest {
        Some(latest) => println!("{} candles, latest {}", status.count, latest),
        None => println!("0 candles"),
    }
    Ok(())
}
