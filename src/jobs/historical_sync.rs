//! Sync job for historical (price, market cap, volume) series.
//!
//! Walks the top coins by market cap sequentially; a failure for one coin
//! is logged and the cycle moves on. The (coin_id, timestamp) key makes
//! overlapping windows converge instead of duplicating.

use sea_orm::DatabaseConnection;
use tokio::time::{Duration, interval, sleep};

use crate::services::coingecko::CoinGeckoService;
use crate::services::{normalize, upsert};

const TOP_COINS: usize = 100;
const CHART_DAYS: u32 = 365;
const COIN_PACING: Duration = Duration::from_secs(2);

pub async fn start_historical_sync_job(db: DatabaseConnection, coingecko: CoinGeckoService) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(21600)); // Every 6 hours

        loop {
            interval.tick().await;
            tracing::info!("Starting historical prices sync cycle");

            if let Err(e) = sync_historical_prices(&db, &coingecko).await {
                tracing::error!("Historical prices sync cycle failed: {}", e);
            }
        }
    });
}

pub async fn sync_historical_prices(
    db: &DatabaseConnection,
    coingecko: &CoinGeckoService,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ids = coingecko.fetch_top_market_cap_ids(TOP_COINS).await?;

    let mut stored = 0u64;
    let mut error_count = 0usize;

    for coin_id in &ids {
        match fetch_and_store_series(db, coingecko, coin_id).await {
            Ok(count) => {
                stored += count;
                tracing::debug!("Stored {} historical points for {}", count, coin_id);
            }
            Err(e) => {
                tracing::warn!("Historical sync failed for {}: {}", coin_id, e);
                error_count += 1;
            }
        }

        sleep(COIN_PACING).await;
    }

    tracing::info!(
        "Historical prices sync complete: {} rows upserted across {} coins, {} errors",
        stored,
        ids.len(),
        error_count
    );

    Ok(())
}

async fn fetch_and_store_series(
    db: &DatabaseConnection,
    coingecko: &CoinGeckoService,
    coin_id: &str,
) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
    let chart = coingecko
        .fetch_market_chart(coin_id, "usd", CHART_DAYS, "daily")
        .await?;

    let rows = normalize::normalize_chart(coin_id, &chart);

    Ok(upsert::upsert_historical_prices(db, rows).await?)
}
