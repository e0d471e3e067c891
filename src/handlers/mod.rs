pub mod auth;
pub mod coins;
pub mod historical;
pub mod portfolio;

use axum::Json;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sea_orm::DbErr;

use crate::models::common::ErrorResponse;

pub(crate) fn db_error(e: DbErr) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("Database error: {}", e),
        }),
    )
}

pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
