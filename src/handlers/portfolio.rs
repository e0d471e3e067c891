use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use std::collections::HashMap;

use crate::entities::{coins, portfolio, prelude::*, prices};
use crate::handlers::auth::AuthUser;
use crate::handlers::{db_error, to_f64};
use crate::models::common::ErrorResponse;
use crate::models::portfolio::{
    AddHoldingRequest, AddHoldingResponse, PortfolioEntryResponse, PortfolioResponse,
};
use crate::services::upsert;
use crate::AppState;

pub async fn get_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PortfolioResponse>, (StatusCode, Json<ErrorResponse>)> {
    let holdings = Portfolio::find()
        .filter(portfolio::Column::UserId.eq(user.user_id))
        .all(&state.db)
        .await
        .map_err(db_error)?;

    if holdings.is_empty() {
        return Ok(Json(PortfolioResponse {
            holdings: vec![],
            total_value: 0.0,
        }));
    }

    let ids: Vec<String> = holdings.iter().map(|h| h.coin_id.clone()).collect();

    let coin_rows = Coins::find()
        .filter(coins::Column::CoinId.is_in(ids.clone()))
        .all(&state.db)
        .await
        .map_err(db_error)?;
    let coin_map: HashMap<String, coins::Model> = coin_rows
        .into_iter()
        .map(|c| (c.coin_id.clone(), c))
        .collect();

    let price_rows = Prices::find()
        .filter(prices::Column::CoinId.is_in(ids))
        .all(&state.db)
        .await
        .map_err(db_error)?;
    let price_map: HashMap<String, prices::Model> = price_rows
        .into_iter()
        .map(|p| (p.coin_id.clone(), p))
        .collect();

    let mut total_value = 0.0;
    let entries: Vec<PortfolioEntryResponse> = holdings
        .into_iter()
        .map(|holding| {
            let amount = to_f64(holding.amount);
            let coin = coin_map.get(&holding.coin_id);
            let price = price_map.get(&holding.coin_id);

            let current_price = price.map(|p| to_f64(p.current_price));
            let value = current_price.map(|p| p * amount);
            if let Some(v) = value {
                total_value += v;
            }

            PortfolioEntryResponse {
                coin_id: holding.coin_id,
                name: coin.map(|c| c.name.clone()),
                symbol: coin.map(|c| c.symbol.clone()),
                amount,
                current_price,
                value,
            }
        })
        .collect();

    Ok(Json(PortfolioResponse {
        holdings: entries,
        total_value,
    }))
}

pub async fn add_holding(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddHoldingRequest>,
) -> Result<(StatusCode, Json<AddHoldingResponse>), (StatusCode, Json<ErrorResponse>)> {
    let amount = Decimal::from_f64_retain(payload.amount)
        .filter(|a| *a > Decimal::ZERO)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Amount must be a positive number".to_string(),
                }),
            )
        })?;

    let coin_exists = Coins::find_by_id(payload.coin_id.as_str())
        .one(&state.db)
        .await
        .map_err(db_error)?
        .is_some();

    if !coin_exists {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Coin '{}' not found", payload.coin_id),
            }),
        ));
    }

    let entry = portfolio::ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        coin_id: Set(payload.coin_id.clone()),
        amount: Set(amount),
        created_at: Set(Utc::now()),
    };

    upsert::upsert_portfolio_entries(&state.db, vec![entry])
        .await
        .map_err(db_error)?;

    // Re-read so the response reflects the merged amount, not the delta.
    let merged = Portfolio::find()
        .filter(portfolio::Column::UserId.eq(user.user_id))
        .filter(portfolio::Column::CoinId.eq(&payload.coin_id))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .map(|row| to_f64(row.amount))
        .unwrap_or_else(|| amount.to_f64().unwrap_or(0.0));

    Ok((
        StatusCode::CREATED,
        Json(AddHoldingResponse {
            coin_id: payload.coin_id,
            amount: merged,
        }),
    ))
}
