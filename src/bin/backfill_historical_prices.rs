//! One-shot backfill of the historical and OHLC series for the top coins.
//!
//! Runs the same sync cycles the server schedules, then exits. Useful for
//! seeding a fresh database before the first scheduled tick.

use sea_orm::Database;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cryptofolio_backend::config::AppConfig;
use cryptofolio_backend::jobs::{historical_sync, ohlc_sync};
use cryptofolio_backend::services::coingecko::CoinGeckoService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let db = Database::connect(&config.database_url).await?;

    let coingecko = CoinGeckoService::new(config.coingecko_api_key, config.coingecko_base_url);

    tracing::info!("Starting historical prices backfill...");
    historical_sync::sync_historical_prices(&db, &coingecko).await?;

    tracing::info!("Starting OHLC backfill...");
    ohlc_sync::sync_ohlc_prices(&db, &coingecko).await?;

    tracing::info!("Backfill complete");

    Ok(())
}
