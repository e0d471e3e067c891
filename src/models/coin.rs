use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One coin with its latest market snapshot, as served by the list and
/// detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketCoin {
    pub coin_id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub market_cap: f64,
    pub market_cap_rank: Option<i32>,
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: f64,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_percentage_24h: f64,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub ath: Option<f64>,
    pub ath_date: Option<DateTime<Utc>>,
    pub atl: Option<f64>,
    pub atl_date: Option<DateTime<Utc>>,
    pub image_path: Option<String>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinListResponse {
    pub coins: Vec<MarketCoin>,
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoinListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub sort_key: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GainersQuery {
    pub limit: Option<u64>,
    /// When present, only the requested side is populated.
    pub gainer: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    pub coin: String,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GainersLosersResponse {
    pub gainers: Vec<MarketCoin>,
    pub losers: Vec<MarketCoin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummaryResponse {
    pub total_coins: i64,
    pub total_market_cap: f64,
    pub total_volume_24h: f64,
    pub average_price: f64,
}
