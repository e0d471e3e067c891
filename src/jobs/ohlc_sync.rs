//! Sync job for OHLC candle windows, same discipline as the historical
//! series sync but over a shorter top list and day window.

use sea_orm::DatabaseConnection;
use tokio::time::{Duration, interval, sleep};

use crate::services::coingecko::CoinGeckoService;
use crate::services::{normalize, upsert};

const TOP_COINS: usize = 50;
const OHLC_DAYS: u32 = 30;
const COIN_PACING: Duration = Duration::from_secs(2);

pub async fn start_ohlc_sync_job(db: DatabaseConnection, coingecko: CoinGeckoService) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(21600)); // Every 6 hours

        loop {
            interval.tick().await;
            tracing::info!("Starting OHLC sync cycle");

            if let Err(e) = sync_ohlc_prices(&db, &coingecko).await {
                tracing::error!("OHLC sync cycle failed: {}", e);
            }
        }
    });
}

pub async fn sync_ohlc_prices(
    db: &DatabaseConnection,
    coingecko: &CoinGeckoService,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ids = coingecko.fetch_top_market_cap_ids(TOP_COINS).await?;

    let mut stored = 0u64;
    let mut error_count = 0usize;

    for coin_id in &ids {
        match fetch_and_store_candles(db, coingecko, coin_id).await {
            Ok(count) => {
                stored += count;
                tracing::debug!("Stored {} OHLC candles for {}", count, coin_id);
            }
            Err(e) => {
                tracing::warn!("OHLC sync failed for {}: {}", coin_id, e);
                error_count += 1;
            }
        }

        sleep(COIN_PACING).await;
    }

    tracing::info!(
        "OHLC sync complete: {} rows upserted across {} coins, {} errors",
        stored,
        ids.len(),
        error_count
    );

    Ok(())
}

async fn fetch_and_store_candles(
    db: &DatabaseConnection,
    coingecko: &CoinGeckoService,
    coin_id: &str,
) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
    let candles = coingecko.fetch_ohlc(coin_id, "usd", OHLC_DAYS).await?;

    let rows = normalize::normalize_ohlc(coin_id, &candles);

    Ok(upsert::upsert_ohlc_prices(db, rows).await?)
}
