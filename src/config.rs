//! Process configuration, read once at startup and passed into components.

use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub coingecko_api_key: String,
    pub coingecko_base_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub icons_dir: String,
    pub download_icons: bool,
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required; everything else has a
    /// working default. `COINGECKO_API_KEY` may be empty when using the
    /// public demo tier.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| "DATABASE_URL must be set".to_string())?,
            coingecko_api_key: env::var("COINGECKO_API_KEY").unwrap_or_default(),
            coingecko_base_url: env::var("COINGECKO_BASE_URL")
                .unwrap_or_else(|_| "https://api.coingecko.com/api/v3".to_string()),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| "JWT_SECRET must be set".to_string())?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            icons_dir: env::var("COIN_ICONS_DIR").unwrap_or_else(|_| "coin_icons".to_string()),
            download_icons: env::var("DOWNLOAD_COIN_ICONS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}
