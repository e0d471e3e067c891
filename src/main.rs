use axum::routing::{get, post};
use axum::Router;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cryptofolio_backend::config::AppConfig;
use cryptofolio_backend::handlers;
use cryptofolio_backend::jobs;
use cryptofolio_backend::services::coingecko::CoinGeckoService;
use cryptofolio_backend::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cryptofolio_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url).await?;

    // Run migrations
    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None).await?;

    let coingecko = CoinGeckoService::new(
        config.coingecko_api_key.clone(),
        config.coingecko_base_url.clone(),
    );

    let state = AppState {
        db: db.clone(),
        config: config.clone(),
    };

    // Start background sync jobs
    jobs::coins_sync::start_coins_sync_job(db.clone(), coingecko.clone()).await;
    jobs::prices_sync::start_prices_sync_job(db.clone(), coingecko.clone(), config.clone()).await;
    jobs::historical_sync::start_historical_sync_job(db.clone(), coingecko.clone()).await;
    jobs::ohlc_sync::start_ohlc_sync_job(db, coingecko).await;

    // Build router
    let api = Router::new()
        .route("/coin/{coin_id}", get(handlers::coins::get_coin))
        .route("/coins/all", get(handlers::coins::list_coins))
        .route("/coins/search", get(handlers::coins::search_coins))
        .route(
            "/coins/top-market-cap",
            get(handlers::coins::top_market_cap),
        )
        .route(
            "/coins/top-gainers-losers",
            get(handlers::coins::top_gainers_losers),
        )
        .route("/coins/summary", get(handlers::coins::market_summary))
        .route(
            "/coins/{coin_id}/historical",
            get(handlers::historical::get_historical_prices),
        )
        .route(
            "/coins/{coin_id}/ohlc",
            get(handlers::historical::get_ohlc_prices),
        )
        .route("/register", post(handlers::auth::register))
        .route("/token", post(handlers::auth::login))
        .route("/me", get(handlers::auth::me))
        .route(
            "/portfolio",
            get(handlers::portfolio::get_portfolio).post(handlers::portfolio::add_holding),
        );

    let app = Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> &'static str {
    "ok"
}
