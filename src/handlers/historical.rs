use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder};

use crate::entities::{historical_prices, ohlc_prices, prelude::*};
use crate::handlers::{db_error, to_f64};
use crate::models::common::ErrorResponse;
use crate::models::historical::{
    HistoricalPricePoint, HistoricalPricesResponse, HistoryQuery, OhlcPoint, OhlcResponse,
};
use crate::AppState;

const DEFAULT_HISTORY_DAYS: i64 = 365;
const DEFAULT_OHLC_DAYS: i64 = 30;

fn clamp_days(requested: Option<i64>, default: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, 365)
}

pub async fn get_historical_prices(
    State(state): State<AppState>,
    Path(coin_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoricalPricesResponse>, (StatusCode, Json<ErrorResponse>)> {
    let days = clamp_days(query.days, DEFAULT_HISTORY_DAYS);
    let cutoff = Utc::now() - chrono::Duration::days(days);

    let rows = HistoricalPrices::find()
        .filter(historical_prices::Column::CoinId.eq(&coin_id))
        .filter(historical_prices::Column::Timestamp.gte(cutoff))
        .order_by(historical_prices::Column::Timestamp, Order::Asc)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    if rows.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!(
                    "No historical price data for coin '{}' in the last {} days",
                    coin_id, days
                ),
            }),
        ));
    }

    let prices = rows
        .into_iter()
        .map(|row| HistoricalPricePoint {
            timestamp: row.timestamp,
            price: to_f64(row.price),
            market_cap: row.market_cap.and_then(|d| d.to_f64()),
            volume: row.volume.and_then(|d| d.to_f64()),
        })
        .collect();

    Ok(Json(HistoricalPricesResponse { coin_id, prices }))
}

pub async fn get_ohlc_prices(
    State(state): State<AppState>,
    Path(coin_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<OhlcResponse>, (StatusCode, Json<ErrorResponse>)> {
    let days = clamp_days(query.days, DEFAULT_OHLC_DAYS);
    let cutoff = Utc::now() - chrono::Duration::days(days);

    let rows = OhlcPrices::find()
        .filter(ohlc_prices::Column::CoinId.eq(&coin_id))
        .filter(ohlc_prices::Column::Timestamp.gte(cutoff))
        .order_by(ohlc_prices::Column::Timestamp, Order::Asc)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    if rows.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!(
                    "No OHLC data for coin '{}' in the last {} days",
                    coin_id, days
                ),
            }),
        ));
    }

    let candles = rows
        .into_iter()
        .map(|row| OhlcPoint {
            timestamp: row.timestamp,
            open: to_f64(row.open),
            high: to_f64(row.high),
            low: to_f64(row.low),
            close: to_f64(row.close),
        })
        .collect();

    Ok(Json(OhlcResponse { coin_id, candles }))
}
