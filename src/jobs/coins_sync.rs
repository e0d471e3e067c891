//! Sync job for the coin identity catalog.
//!
//! Coins are upsert-only: rows are never deleted, and re-listing an existing
//! coin only corrects its symbol/name.

use sea_orm::{DatabaseConnection, Set};
use tokio::time::{Duration, interval};

use crate::entities::coins;
use crate::services::coingecko::CoinGeckoService;
use crate::services::upsert;

/// Keep each INSERT comfortably under the wire parameter limit.
const INSERT_CHUNK_SIZE: usize = 1000;

pub async fn start_coins_sync_job(db: DatabaseConnection, coingecko: CoinGeckoService) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(86400)); // Every 24 hours

        // The first tick completes immediately, so the catalog is populated
        // right after startup.
        loop {
            interval.tick().await;
            tracing::info!("Starting scheduled coin identity sync");

            if let Err(e) = sync_coins(&db, &coingecko).await {
                tracing::error!("Failed to sync coin identities: {}", e);
            }
        }
    });
}

pub async fn sync_coins(
    db: &DatabaseConnection,
    coingecko: &CoinGeckoService,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listed = coingecko.list_coins().await?;

    let rows: Vec<coins::ActiveModel> = listed
        .into_iter()
        .map(|entry| coins::ActiveModel {
            coin_id: Set(entry.id),
            symbol: Set(entry.symbol),
            name: Set(entry.name),
        })
        .collect();

    let mut affected = 0u64;
    for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
        affected += upsert::upsert_coins(db, chunk.to_vec()).await?;
    }

    tracing::info!("Coin identity sync complete: {} rows upserted", affected);

    Ok(())
}
