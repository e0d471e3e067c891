// src/lib.rs

use sea_orm::DatabaseConnection;

use config::AppConfig;

// Mock connections are not cloneable, so the test profile skips the derive;
// only the server binary's router needs a cloneable state.
#[cfg_attr(not(test), derive(Clone))]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
}

pub mod config;

pub mod entities {
    pub mod prelude;
    pub mod coins;
    pub mod historical_prices;
    pub mod ohlc_prices;
    pub mod portfolio;
    pub mod prices;
    pub mod users;
}

pub mod services {
    pub mod auth;
    pub mod coingecko;
    pub mod icons;
    pub mod normalize;
    pub mod upsert;
}

pub mod jobs;
pub mod models;
pub mod handlers;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    // The state must stay constructible against a mock connection so the
    // in-crate test suite builds alongside the library.
    #[test]
    fn app_state_builds_on_a_mock_connection() {
        let state = AppState {
            db: MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
            config: AppConfig {
                database_url: "postgres://localhost/test".to_string(),
                coingecko_api_key: String::new(),
                coingecko_base_url: "http://localhost".to_string(),
                jwt_secret: "test-secret".to_string(),
                bind_addr: "127.0.0.1:0".to_string(),
                icons_dir: "coin_icons".to_string(),
                download_icons: false,
            },
        };

        assert_eq!(state.config.jwt_secret, "test-secret");
        assert!(!state.config.download_icons);
    }
}
