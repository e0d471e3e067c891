//! Orchestrator for the current-price refresh cycle.
//!
//! Fetches the full identity list, partitions it into provider-sized
//! batches, and runs fetch -> normalize -> upsert per batch with a fixed
//! pacing delay between batches. One bad batch never aborts the cycle;
//! a failed identity-list fetch aborts it because nothing downstream can
//! proceed without identities.

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tokio::time::{Duration, interval, sleep};

use crate::config::AppConfig;
use crate::services::coingecko::{CoinGeckoService, MARKETS_PAGE_LIMIT};
use crate::services::{icons, normalize, upsert};

/// Fixed delay between batches, keeping the request rate under the
/// provider's limit. Not adaptive by design.
const BATCH_PACING: Duration = Duration::from_secs(2);

pub async fn start_prices_sync_job(
    db: DatabaseConnection,
    coingecko: CoinGeckoService,
    config: AppConfig,
) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(900)); // Every 15 minutes

        // Iterations share this one task, so a cycle can never overlap the
        // next: the tick is simply consumed late when a cycle overruns.
        loop {
            interval.tick().await;
            tracing::info!("Starting coin prices sync cycle");

            if let Err(e) = sync_coin_prices(&db, &coingecko, &config).await {
                tracing::error!("Coin prices sync cycle failed: {}", e);
            }
        }
    });
}

#[derive(Debug, Default)]
struct BatchOutcome {
    upserted: u64,
    dropped: usize,
}

pub async fn sync_coin_prices(
    db: &DatabaseConnection,
    coingecko: &CoinGeckoService,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listed = coingecko.list_coins().await?;
    let ids: Vec<String> = listed.into_iter().map(|entry| entry.id).collect();

    let total_batches = ids.len().div_ceil(MARKETS_PAGE_LIMIT);
    let mut upserted = 0u64;
    let mut dropped = 0usize;
    let mut failed_batches = 0usize;

    for (batch_idx, batch) in normalize::chunk_ids(&ids, MARKETS_PAGE_LIMIT).enumerate() {
        match refresh_price_batch(db, coingecko, config, batch).await {
            Ok(outcome) => {
                upserted += outcome.upserted;
                dropped += outcome.dropped;
            }
            Err(e) => {
                tracing::warn!(
                    "Price batch {}/{} failed, continuing: {}",
                    batch_idx + 1,
                    total_batches,
                    e
                );
                failed_batches += 1;
            }
        }

        sleep(BATCH_PACING).await;
    }

    tracing::info!(
        "Coin prices sync complete: {} rows upserted, {} records dropped, {}/{} batches failed",
        upserted,
        dropped,
        failed_batches,
        total_batches
    );

    Ok(())
}

async fn refresh_price_batch(
    db: &DatabaseConnection,
    coingecko: &CoinGeckoService,
    config: &AppConfig,
    batch: &[String],
) -> Result<BatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
    let raw = coingecko.fetch_markets(batch).await?;
    if raw.is_empty() {
        return Ok(BatchOutcome::default());
    }

    let now = Utc::now();
    let mut rows = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for snapshot in &raw {
        match normalize::normalize_snapshot(snapshot, now, &config.icons_dir) {
            Some(row) => {
                if config.download_icons {
                    if let Some(url) = &snapshot.image {
                        let path = normalize::icon_path(&config.icons_dir, &snapshot.id);
                        if let Err(e) =
                            icons::download_icon_if_missing(coingecko.client(), url, &path).await
                        {
                            tracing::warn!("Icon download failed for {}: {}", snapshot.id, e);
                        }
                    }
                }
                rows.push(row);
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {} stale or unpriced records in batch", dropped);
    }

    let upserted = upsert::upsert_prices(db, rows).await?;

    Ok(BatchOutcome { upserted, dropped })
}
