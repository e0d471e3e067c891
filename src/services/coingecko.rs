use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Provider-imposed cap on the number of ids per /coins/markets request.
pub const MARKETS_PAGE_LIMIT: usize = 250;

#[derive(Clone)]
pub struct CoinGeckoService {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinListEntry {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// One raw record from /coins/markets. Everything beyond the id is optional:
/// unpriced or delisted coins come back with nulls and the normalizer decides
/// what to keep.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSnapshot {
    pub id: String,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<i32>,
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub ath: Option<f64>,
    pub ath_date: Option<String>,
    pub atl: Option<f64>,
    pub atl_date: Option<String>,
    pub last_updated: Option<String>,
    pub image: Option<String>,
}

/// Three time-aligned (epoch-ms, value) series from /market_chart.
#[derive(Debug, Deserialize)]
pub struct MarketChartResponse {
    pub prices: Vec<[f64; 2]>,
    pub market_caps: Vec<[f64; 2]>,
    pub total_volumes: Vec<[f64; 2]>,
}

impl CoinGeckoService {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch the full coin identity catalog from /coins/list.
    pub async fn list_coins(
        &self,
    ) -> Result<Vec<CoinListEntry>, Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("Fetching coin identity list from CoinGecko /coins/list");

        let url = format!("{}/coins/list", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-cg-demo-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("CoinGecko API error {}: {}", status, error_text).into());
        }

        let coins: Vec<CoinListEntry> = response.json().await?;

        tracing::info!("Fetched {} coin identities from CoinGecko", coins.len());

        Ok(coins)
    }

    /// Fetch market snapshots for up to [`MARKETS_PAGE_LIMIT`] coin ids.
    /// Callers batch larger id sets before calling.
    pub async fn fetch_markets(
        &self,
        ids: &[String],
    ) -> Result<Vec<MarketSnapshot>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/coins/markets", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-cg-demo-api-key", &self.api_key)
            .query(&[
                ("vs_currency", "usd"),
                ("ids", &ids.join(",")),
                ("per_page", "250"),
                ("precision", "3"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("CoinGecko API error {}: {}", status, error_text).into());
        }

        let snapshots: Vec<MarketSnapshot> = response.json().await?;

        tracing::debug!(
            "Fetched {} market snapshots for {} ids",
            snapshots.len(),
            ids.len()
        );

        Ok(snapshots)
    }

    /// Fetch the ids of the top `n` coins by market capitalization.
    pub async fn fetch_top_market_cap_ids(
        &self,
        n: usize,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        tracing::info!("Fetching top {} coins by market cap from CoinGecko", n);

        let url = format!("{}/coins/markets", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-cg-demo-api-key", &self.api_key)
            .query(&[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", &n.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("CoinGecko API error {}: {}", status, error_text).into());
        }

        let snapshots: Vec<MarketSnapshot> = response.json().await?;

        Ok(snapshots.into_iter().map(|s| s.id).collect())
    }

    /// Fetch a historical market chart (prices, market caps, volumes) for one coin.
    pub async fn fetch_market_chart(
        &self,
        coin_id: &str,
        currency: &str,
        days: u32,
        interval: &str,
    ) -> Result<MarketChartResponse, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, coin_id);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-cg-demo-api-key", &self.api_key)
            .query(&[
                ("vs_currency", currency),
                ("days", &days.to_string()),
                ("interval", interval),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("CoinGecko API error {}: {}", status, error_text).into());
        }

        let chart: MarketChartResponse = response.json().await?;

        tracing::debug!("Fetched {} chart points for {}", chart.prices.len(), coin_id);

        Ok(chart)
    }

    /// Fetch OHLC candles for one coin as [ms, open, high, low, close] rows.
    pub async fn fetch_ohlc(
        &self,
        coin_id: &str,
        currency: &str,
        days: u32,
    ) -> Result<Vec<[f64; 5]>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/coins/{}/ohlc", self.base_url, coin_id);

        let response = self
            .client
            .get(&url)
            .header("accept", "application/json")
            .header("x-cg-demo-api-key", &self.api_key)
            .query(&[("vs_currency", currency), ("days", &days.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("CoinGecko API error {}: {}", status, error_text).into());
        }

        let candles: Vec<[f64; 5]> = response.json().await?;

        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_snapshot_decodes_sparse_record() {
        let raw = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 43250.123,
            "market_cap": 846729301234.0,
            "market_cap_rank": 1,
            "fully_diluted_valuation": null,
            "total_volume": 21034567890.0,
            "high_24h": 43900.0,
            "low_24h": 42100.5,
            "price_change_24h": 512.3,
            "price_change_percentage_24h": null,
            "market_cap_change_24h": null,
            "market_cap_change_percentage_24h": 1.2,
            "circulating_supply": 19600000.0,
            "total_supply": 21000000.0,
            "max_supply": 21000000.0,
            "ath": 69045.0,
            "ath_date": "2021-11-10T14:24:11.849Z",
            "atl": 67.81,
            "atl_date": "2013-07-06T00:00:00.000Z",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "last_updated": "2024-01-01T11:59:30.000Z"
        }"#;

        let snapshot: MarketSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.id, "bitcoin");
        assert_eq!(snapshot.current_price, Some(43250.123));
        assert_eq!(snapshot.price_change_percentage_24h, None);
        assert_eq!(snapshot.market_cap_rank, Some(1));
        assert!(snapshot.fully_diluted_valuation.is_none());
    }

    #[test]
    fn market_snapshot_tolerates_unpriced_coin() {
        let raw = r#"{
            "id": "dead-coin",
            "current_price": null,
            "market_cap": null,
            "last_updated": null
        }"#;

        let snapshot: MarketSnapshot = serde_json::from_str(raw).unwrap();
        assert!(snapshot.current_price.is_none());
        assert!(snapshot.last_updated.is_none());
    }

    #[test]
    fn market_chart_decodes_aligned_series() {
        let raw = r#"{
            "prices": [[1704067200000, 42000.0], [1704153600000, 43000.0]],
            "market_caps": [[1704067200000, 8.2e11], [1704153600000, 8.4e11]],
            "total_volumes": [[1704067200000, 2.1e10], [1704153600000, 1.9e10]]
        }"#;

        let chart: MarketChartResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.prices[0][0], 1704067200000.0);
        assert_eq!(chart.market_caps[1][1], 8.4e11);
    }

    #[test]
    fn ohlc_rows_decode_as_five_tuples() {
        let raw = "[[1704067200000, 42000.0, 42500.0, 41800.0, 42300.0]]";
        let candles: Vec<[f64; 5]> = serde_json::from_str(raw).unwrap();
        assert_eq!(candles[0][4], 42300.0);
    }
}
