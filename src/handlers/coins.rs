use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::{
    ColumnTrait, Condition, DatabaseBackend, EntityTrait, FromQueryResult, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement,
};
use std::collections::HashMap;

use crate::entities::{coins, prelude::*, prices};
use crate::handlers::{db_error, to_f64};
use crate::models::coin::{
    CoinListQuery, CoinListResponse, GainersLosersResponse, GainersQuery, MarketCoin,
    MarketSummaryResponse, SearchQuery, TopQuery,
};
use crate::models::common::ErrorResponse;
use crate::AppState;

const DEFAULT_PAGE_SIZE: u64 = 100;
const MAX_PAGE_SIZE: u64 = 250;

pub(crate) fn market_coin(coin: &coins::Model, price: &prices::Model) -> MarketCoin {
    MarketCoin {
        coin_id: coin.coin_id.clone(),
        symbol: coin.symbol.clone(),
        name: coin.name.clone(),
        current_price: to_f64(price.current_price),
        market_cap: to_f64(price.market_cap),
        market_cap_rank: price.market_cap_rank,
        fully_diluted_valuation: price.fully_diluted_valuation.and_then(|d| d.to_f64()),
        total_volume: price.total_volume.and_then(|d| d.to_f64()),
        high_24h: price.high_24h.and_then(|d| d.to_f64()),
        low_24h: price.low_24h.and_then(|d| d.to_f64()),
        price_change_24h: price.price_change_24h.and_then(|d| d.to_f64()),
        price_change_percentage_24h: to_f64(price.price_change_percentage_24h),
        market_cap_change_24h: price.market_cap_change_24h.and_then(|d| d.to_f64()),
        market_cap_change_percentage_24h: to_f64(price.market_cap_change_percentage_24h),
        circulating_supply: price.circulating_supply.and_then(|d| d.to_f64()),
        total_supply: price.total_supply.and_then(|d| d.to_f64()),
        max_supply: price.max_supply.and_then(|d| d.to_f64()),
        ath: price.ath.and_then(|d| d.to_f64()),
        ath_date: price.ath_date,
        atl: price.atl.and_then(|d| d.to_f64()),
        atl_date: price.atl_date,
        image_path: price.image_path.clone(),
        last_updated_at: price.last_updated_at,
    }
}

/// Fetch coin metadata for a page of price rows and zip the two into
/// response DTOs, preserving the price rows' order.
async fn join_with_coins(
    state: &AppState,
    price_rows: Vec<prices::Model>,
) -> Result<Vec<MarketCoin>, (StatusCode, Json<ErrorResponse>)> {
    if price_rows.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<String> = price_rows.iter().map(|p| p.coin_id.clone()).collect();

    let coin_rows = Coins::find()
        .filter(coins::Column::CoinId.is_in(ids))
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let coin_map: HashMap<String, coins::Model> = coin_rows
        .into_iter()
        .map(|c| (c.coin_id.clone(), c))
        .collect();

    let mut out = Vec::with_capacity(price_rows.len());
    for price in &price_rows {
        // A price row without catalog metadata means the identity sync has
        // not caught up yet; skip rather than serve a half-empty record.
        let Some(coin) = coin_map.get(&price.coin_id) else {
            continue;
        };
        out.push(market_coin(coin, price));
    }

    Ok(out)
}

pub async fn get_coin(
    State(state): State<AppState>,
    Path(coin_id): Path<String>,
) -> Result<Json<MarketCoin>, (StatusCode, Json<ErrorResponse>)> {
    let coin = Coins::find_by_id(coin_id.as_str())
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Coin '{}' not found", coin_id),
                }),
            )
        })?;

    let price = Prices::find_by_id(coin_id.as_str())
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("No market data for coin '{}'", coin_id),
                }),
            )
        })?;

    Ok(Json(market_coin(&coin, &price)))
}

pub async fn list_coins(
    State(state): State<AppState>,
    Query(query): Query<CoinListQuery>,
) -> Result<Json<CoinListResponse>, (StatusCode, Json<ErrorResponse>)> {
    let sort_col = match query.sort_key.as_deref() {
        None | Some("market_cap") => prices::Column::MarketCap,
        Some("current_price") => prices::Column::CurrentPrice,
        Some("price_change_percentage_24h") => prices::Column::PriceChangePercentage24h,
        Some("total_volume") => prices::Column::TotalVolume,
        Some("market_cap_rank") => prices::Column::MarketCapRank,
        Some(other) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unsupported sort_key '{}'", other),
                }),
            ));
        }
    };

    let sort_order = match query.sort_order.as_deref() {
        None | Some("desc") => Order::Desc,
        Some("asc") => Order::Asc,
        Some(other) => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Unsupported sort_order '{}'", other),
                }),
            ));
        }
    };

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let total = Prices::find()
        .count(&state.db)
        .await
        .map_err(db_error)?;

    let price_rows = Prices::find()
        .order_by(sort_col, sort_order)
        .offset(offset)
        .limit(limit)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let coins = join_with_coins(&state, price_rows).await?;

    Ok(Json(CoinListResponse { coins, total }))
}

pub async fn top_market_cap(
    State(state): State<AppState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<Vec<MarketCoin>>, (StatusCode, Json<ErrorResponse>)> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let price_rows = Prices::find()
        .order_by(prices::Column::MarketCap, Order::Desc)
        .limit(limit)
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let coins = join_with_coins(&state, price_rows).await?;

    Ok(Json(coins))
}

pub async fn top_gainers_losers(
    State(state): State<AppState>,
    Query(query): Query<GainersQuery>,
) -> Result<Json<GainersLosersResponse>, (StatusCode, Json<ErrorResponse>)> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let mut gainers = vec![];
    let mut losers = vec![];

    if query.gainer != Some(false) {
        let rows = Prices::find()
            .order_by(prices::Column::PriceChangePercentage24h, Order::Desc)
            .limit(limit)
            .all(&state.db)
            .await
            .map_err(db_error)?;
        gainers = join_with_coins(&state, rows).await?;
    }

    if query.gainer != Some(true) {
        let rows = Prices::find()
            .order_by(prices::Column::PriceChangePercentage24h, Order::Asc)
            .limit(limit)
            .all(&state.db)
            .await
            .map_err(db_error)?;
        losers = join_with_coins(&state, rows).await?;
    }

    Ok(Json(GainersLosersResponse { gainers, losers }))
}

pub async fn search_coins(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<MarketCoin>>, (StatusCode, Json<ErrorResponse>)> {
    let term = query.coin.trim();
    if term.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Search query must not be empty".to_string(),
            }),
        ));
    }

    let limit = query.limit.unwrap_or(20).min(MAX_PAGE_SIZE) as usize;

    let coin_rows = Coins::find()
        .filter(
            Condition::any()
                .add(coins::Column::Name.contains(term))
                .add(coins::Column::Symbol.contains(term))
                .add(coins::Column::CoinId.contains(term)),
        )
        .all(&state.db)
        .await
        .map_err(db_error)?;

    if coin_rows.is_empty() {
        return Ok(Json(vec![]));
    }

    let ids: Vec<String> = coin_rows.iter().map(|c| c.coin_id.clone()).collect();

    let price_rows = Prices::find()
        .filter(prices::Column::CoinId.is_in(ids))
        .all(&state.db)
        .await
        .map_err(db_error)?;

    let price_map: HashMap<String, prices::Model> = price_rows
        .into_iter()
        .map(|p| (p.coin_id.clone(), p))
        .collect();

    // Matches without market data yet are omitted; ranking by market cap
    // needs a price row anyway.
    let mut results: Vec<MarketCoin> = coin_rows
        .iter()
        .filter_map(|coin| price_map.get(&coin.coin_id).map(|p| market_coin(coin, p)))
        .collect();

    results.sort_by(|a, b| {
        b.market_cap
            .partial_cmp(&a.market_cap)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);

    Ok(Json(results))
}

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    total_coins: i64,
    total_market_cap: Option<rust_decimal::Decimal>,
    total_volume_24h: Option<rust_decimal::Decimal>,
    average_price: Option<rust_decimal::Decimal>,
}

pub async fn market_summary(
    State(state): State<AppState>,
) -> Result<Json<MarketSummaryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let row = SummaryRow::find_by_statement(Statement::from_string(
        DatabaseBackend::Postgres,
        "SELECT COUNT(*) AS total_coins, \
         SUM(market_cap) AS total_market_cap, \
         SUM(total_volume) AS total_volume_24h, \
         AVG(current_price) AS average_price \
         FROM prices",
    ))
    .one(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Summary query returned no row".to_string(),
            }),
        )
    })?;

    Ok(Json(MarketSummaryResponse {
        total_coins: row.total_coins,
        total_market_cap: row.total_market_cap.map(to_f64).unwrap_or(0.0),
        total_volume_24h: row.total_volume_24h.map(to_f64).unwrap_or(0.0),
        average_price: row.average_price.map(to_f64).unwrap_or(0.0),
    }))
}
