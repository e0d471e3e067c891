use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPricesResponse {
    pub coin_id: String,
    pub prices: Vec<HistoricalPricePoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcPoint {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcResponse {
    pub coin_id: String,
    pub candles: Vec<OhlcPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}
