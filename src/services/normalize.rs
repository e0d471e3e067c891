//! Converts raw CoinGecko records into typed rows ready for upsert.
//!
//! All functions here are pure: validation, staleness filtering and unit
//! conversion happen in one place so the upsert layer only ever sees rows
//! that are safe to persist.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::Set;

use crate::entities::{historical_prices, ohlc_prices, prices};
use crate::services::coingecko::{MarketChartResponse, MarketSnapshot};

/// Snapshots older than this are dropped rather than written: a stale record
/// must not overwrite a fresher stored value.
pub fn freshness_horizon() -> Duration {
    Duration::hours(1)
}

/// Split a list of coin ids into provider-sized request batches.
pub fn chunk_ids(ids: &[String], size: usize) -> std::slice::Chunks<'_, String> {
    ids.chunks(size)
}

/// Parse an ISO-8601 instant with a trailing `Z` into UTC.
pub fn parse_utc(iso: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(iso)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Deterministic local path for a coin's icon asset.
pub fn icon_path(icons_dir: &str, coin_id: &str) -> String {
    format!("{}/{}.png", icons_dir, coin_id)
}

/// Validate one market snapshot and produce an upsert-ready row, or drop it.
///
/// A record is dropped when the current price or market cap is missing or
/// non-positive (not-yet-priced or malformed), when the last-updated
/// timestamp is absent, or when that timestamp is older than the freshness
/// horizon relative to `now`. Optional percentage fields default to zero:
/// by convention absence means "no recorded change".
pub fn normalize_snapshot(
    raw: &MarketSnapshot,
    now: DateTime<Utc>,
    icons_dir: &str,
) -> Option<prices::ActiveModel> {
    let current_price = raw.current_price.and_then(Decimal::from_f64_retain)?;
    if current_price <= Decimal::ZERO {
        return None;
    }

    let market_cap = raw.market_cap.and_then(Decimal::from_f64_retain)?;
    if market_cap <= Decimal::ZERO {
        return None;
    }

    let last_updated_at = parse_utc(raw.last_updated.as_deref()?)?;
    if last_updated_at < now - freshness_horizon() {
        return None;
    }

    let image_path = raw
        .image
        .as_ref()
        .map(|_| icon_path(icons_dir, &raw.id));

    Some(prices::ActiveModel {
        coin_id: Set(raw.id.clone()),
        current_price: Set(current_price),
        market_cap: Set(market_cap),
        market_cap_rank: Set(raw.market_cap_rank),
        fully_diluted_valuation: Set(raw
            .fully_diluted_valuation
            .and_then(Decimal::from_f64_retain)),
        total_volume: Set(raw.total_volume.and_then(Decimal::from_f64_retain)),
        high_24h: Set(raw.high_24h.and_then(Decimal::from_f64_retain)),
        low_24h: Set(raw.low_24h.and_then(Decimal::from_f64_retain)),
        price_change_24h: Set(raw.price_change_24h.and_then(Decimal::from_f64_retain)),
        price_change_percentage_24h: Set(raw
            .price_change_percentage_24h
            .and_then(Decimal::from_f64_retain)
            .unwrap_or(Decimal::ZERO)),
        market_cap_change_24h: Set(raw
            .market_cap_change_24h
            .and_then(Decimal::from_f64_retain)),
        market_cap_change_percentage_24h: Set(raw
            .market_cap_change_percentage_24h
            .and_then(Decimal::from_f64_retain)
            .unwrap_or(Decimal::ZERO)),
        circulating_supply: Set(raw.circulating_supply.and_then(Decimal::from_f64_retain)),
        total_supply: Set(raw.total_supply.and_then(Decimal::from_f64_retain)),
        max_supply: Set(raw.max_supply.and_then(Decimal::from_f64_retain)),
        ath: Set(raw.ath.and_then(Decimal::from_f64_retain)),
        ath_date: Set(raw.ath_date.as_deref().and_then(parse_utc)),
        atl: Set(raw.atl.and_then(Decimal::from_f64_retain)),
        atl_date: Set(raw.atl_date.as_deref().and_then(parse_utc)),
        last_updated_at: Set(last_updated_at),
        image_path: Set(image_path),
    })
}

/// Zip the three chart series into historical rows. No freshness filter:
/// every point is legitimately historical.
pub fn normalize_chart(
    coin_id: &str,
    chart: &MarketChartResponse,
) -> Vec<historical_prices::ActiveModel> {
    let mut rows: Vec<historical_prices::ActiveModel> = Vec::with_capacity(chart.prices.len());
    let mut last_ts: Option<DateTime<Utc>> = None;

    for (i, point) in chart.prices.iter().enumerate() {
        let Some(timestamp) = DateTime::from_timestamp_millis(point[0] as i64) else {
            continue;
        };
        let Some(price) = Decimal::from_f64_retain(point[1]) else {
            continue;
        };

        let market_cap = chart
            .market_caps
            .get(i)
            .and_then(|m| Decimal::from_f64_retain(m[1]));
        let volume = chart
            .total_volumes
            .get(i)
            .and_then(|v| Decimal::from_f64_retain(v[1]));

        let row = historical_prices::ActiveModel {
            coin_id: Set(coin_id.to_string()),
            timestamp: Set(timestamp),
            price: Set(price),
            market_cap: Set(market_cap),
            volume: Set(volume),
        };

        // The provider can repeat the trailing point; a duplicate key inside
        // one INSERT would make the conflict clause fail, so keep the latest.
        if last_ts == Some(timestamp) {
            rows.pop();
        }
        last_ts = Some(timestamp);
        rows.push(row);
    }

    rows
}

/// Convert raw [ms, open, high, low, close] candles into OHLC rows.
pub fn normalize_ohlc(coin_id: &str, candles: &[[f64; 5]]) -> Vec<ohlc_prices::ActiveModel> {
    let mut rows: Vec<ohlc_prices::ActiveModel> = Vec::with_capacity(candles.len());
    let mut last_ts: Option<DateTime<Utc>> = None;

    for candle in candles {
        let Some(timestamp) = DateTime::from_timestamp_millis(candle[0] as i64) else {
            continue;
        };
        let (Some(open), Some(high), Some(low), Some(close)) = (
            Decimal::from_f64_retain(candle[1]),
            Decimal::from_f64_retain(candle[2]),
            Decimal::from_f64_retain(candle[3]),
            Decimal::from_f64_retain(candle[4]),
        ) else {
            continue;
        };

        let row = ohlc_prices::ActiveModel {
            coin_id: Set(coin_id.to_string()),
            timestamp: Set(timestamp),
            open: Set(open),
            high: Set(high),
            low: Set(low),
            close: Set(close),
        };

        if last_ts == Some(timestamp) {
            rows.pop();
        }
        last_ts = Some(timestamp);
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveValue;

    fn snapshot(id: &str) -> MarketSnapshot {
        MarketSnapshot {
            id: id.to_string(),
            current_price: Some(100.5),
            market_cap: Some(2_000_000.0),
            market_cap_rank: Some(42),
            fully_diluted_valuation: None,
            total_volume: Some(50_000.0),
            high_24h: Some(110.0),
            low_24h: Some(95.0),
            price_change_24h: Some(1.5),
            price_change_percentage_24h: Some(1.51),
            market_cap_change_24h: None,
            market_cap_change_percentage_24h: None,
            circulating_supply: Some(1_000_000.0),
            total_supply: None,
            max_supply: None,
            ath: Some(250.0),
            ath_date: Some("2021-11-10T14:24:11.849Z".to_string()),
            atl: Some(0.5),
            atl_date: Some("2019-03-02T00:00:00.000Z".to_string()),
            last_updated: Some("2024-01-01T11:59:00Z".to_string()),
            image: Some("https://example.com/icon.png".to_string()),
        }
    }

    fn processing_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn set<T: Clone + Into<sea_orm::Value>>(value: &ActiveValue<T>) -> T {
        match value {
            ActiveValue::Set(v) => v.clone(),
            _ => panic!("expected Set value"),
        }
    }

    #[test]
    fn fresh_valid_snapshot_is_kept() {
        let row = normalize_snapshot(&snapshot("bitcoin"), processing_time(), "coin_icons")
            .expect("snapshot should pass validation");

        assert_eq!(set(&row.coin_id), "bitcoin");
        assert_eq!(set(&row.current_price), dec!(100.5));
        assert_eq!(set(&row.market_cap), dec!(2000000));
        assert_eq!(set(&row.image_path), Some("coin_icons/bitcoin.png".to_string()));
        assert_eq!(
            set(&row.ath_date).unwrap(),
            Utc.with_ymd_and_hms(2021, 11, 10, 14, 24, 11).unwrap()
                + Duration::milliseconds(849)
        );
    }

    #[test]
    fn non_positive_price_is_dropped() {
        let mut raw = snapshot("zero");
        raw.current_price = Some(0.0);
        assert!(normalize_snapshot(&raw, processing_time(), "icons").is_none());

        raw.current_price = Some(-1.0);
        assert!(normalize_snapshot(&raw, processing_time(), "icons").is_none());
    }

    #[test]
    fn missing_required_fields_are_dropped() {
        let mut raw = snapshot("no-price");
        raw.current_price = None;
        assert!(normalize_snapshot(&raw, processing_time(), "icons").is_none());

        let mut raw = snapshot("no-mcap");
        raw.market_cap = None;
        assert!(normalize_snapshot(&raw, processing_time(), "icons").is_none());

        let mut raw = snapshot("no-ts");
        raw.last_updated = None;
        assert!(normalize_snapshot(&raw, processing_time(), "icons").is_none());

        let mut raw = snapshot("neg-mcap");
        raw.market_cap = Some(-5.0);
        assert!(normalize_snapshot(&raw, processing_time(), "icons").is_none());
    }

    #[test]
    fn stale_snapshot_is_dropped_fresh_one_kept() {
        // Processing at 12:00:00Z: a 10:30 record is beyond the one hour
        // horizon, an 11:30:01 record is inside it.
        let mut stale = snapshot("stale");
        stale.last_updated = Some("2024-01-01T10:30:00Z".to_string());
        assert!(normalize_snapshot(&stale, processing_time(), "icons").is_none());

        let mut fresh = snapshot("fresh");
        fresh.last_updated = Some("2024-01-01T11:30:01Z".to_string());
        assert!(normalize_snapshot(&fresh, processing_time(), "icons").is_some());
    }

    #[test]
    fn exactly_one_hour_old_is_still_accepted() {
        let mut raw = snapshot("boundary");
        raw.last_updated = Some("2024-01-01T11:00:00Z".to_string());
        assert!(normalize_snapshot(&raw, processing_time(), "icons").is_some());
    }

    #[test]
    fn missing_percentages_default_to_zero() {
        let mut raw = snapshot("no-change");
        raw.price_change_percentage_24h = None;
        raw.market_cap_change_percentage_24h = None;

        let row = normalize_snapshot(&raw, processing_time(), "icons").unwrap();
        assert_eq!(set(&row.price_change_percentage_24h), Decimal::ZERO);
        assert_eq!(set(&row.market_cap_change_percentage_24h), Decimal::ZERO);
    }

    #[test]
    fn batching_covers_all_ids_without_duplicates() {
        let ids: Vec<String> = (0..537).map(|i| format!("coin-{}", i)).collect();

        let batches: Vec<&[String]> = chunk_ids(&ids, 250).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 250);
        assert_eq!(batches[1].len(), 250);
        assert_eq!(batches[2].len(), 37);

        let flattened: Vec<&String> = batches.into_iter().flatten().collect();
        assert_eq!(flattened.len(), 537);
        let unique: std::collections::HashSet<&String> = flattened.into_iter().collect();
        assert_eq!(unique.len(), 537);
    }

    #[test]
    fn chart_rows_are_keyed_by_utc_instant() {
        let chart = MarketChartResponse {
            prices: vec![[1704067200000.0, 42000.0], [1704153600000.0, 43000.0]],
            market_caps: vec![[1704067200000.0, 8.0e11], [1704153600000.0, 8.1e11]],
            total_volumes: vec![[1704067200000.0, 2.0e10], [1704153600000.0, 2.2e10]],
        };

        let rows = normalize_chart("bitcoin", &chart);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            set(&rows[0].timestamp),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(set(&rows[1].price), dec!(43000));
    }

    #[test]
    fn full_year_chart_produces_one_row_per_point() {
        let day_ms = 86_400_000.0;
        let start = 1672531200000.0; // 2023-01-01T00:00:00Z
        let prices: Vec<[f64; 2]> = (0..365).map(|i| [start + i as f64 * day_ms, 100.0 + i as f64]).collect();
        let market_caps: Vec<[f64; 2]> = (0..365).map(|i| [start + i as f64 * day_ms, 1.0e9]).collect();
        let total_volumes: Vec<[f64; 2]> = (0..365).map(|i| [start + i as f64 * day_ms, 1.0e7]).collect();

        let chart = MarketChartResponse { prices, market_caps, total_volumes };
        let rows = normalize_chart("ethereum", &chart);

        assert_eq!(rows.len(), 365);
        let unique: std::collections::HashSet<String> = rows
            .iter()
            .map(|r| format!("{}", set(&r.timestamp)))
            .collect();
        assert_eq!(unique.len(), 365);
    }

    #[test]
    fn repeated_trailing_chart_point_is_deduplicated() {
        let chart = MarketChartResponse {
            prices: vec![[1704067200000.0, 42000.0], [1704067200000.0, 42001.0]],
            market_caps: vec![[1704067200000.0, 8.0e11], [1704067200000.0, 8.0e11]],
            total_volumes: vec![[1704067200000.0, 2.0e10], [1704067200000.0, 2.0e10]],
        };

        let rows = normalize_chart("bitcoin", &chart);
        assert_eq!(rows.len(), 1);
        assert_eq!(set(&rows[0].price), dec!(42001));
    }

    #[test]
    fn ohlc_candles_convert_ms_epochs() {
        let candles = vec![[1704067200000.0, 42000.0, 42500.0, 41800.0, 42300.0]];
        let rows = normalize_ohlc("bitcoin", &candles);

        assert_eq!(rows.len(), 1);
        assert_eq!(
            set(&rows[0].timestamp),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(set(&rows[0].open), dec!(42000));
        assert_eq!(set(&rows[0].close), dec!(42300));
    }

    #[test]
    fn parse_utc_handles_z_suffix() {
        let parsed = parse_utc("2024-06-15T08:30:00.000Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 6, 15, 8, 30, 0).unwrap());
        assert!(parse_utc("not-a-date").is_none());
    }
}
