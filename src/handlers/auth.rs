use axum::extract::{Form, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use chrono::Utc;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};

use crate::entities::{prelude::*, users};
use crate::handlers::db_error;
use crate::models::auth::{LoginForm, RegisterRequest, TokenResponse, UserResponse};
use crate::models::common::ErrorResponse;
use crate::services::auth;
use crate::AppState;

/// Authenticated caller, extracted from the Authorization bearer token.
/// Handlers that take this as an argument reject unauthenticated requests
/// before their body runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = |msg: &str| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: msg.to_string(),
                }),
            )
        };

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(|| unauthorized("Expected a bearer token"))?;

        let claims = auth::decode_access_token(token, &state.config.jwt_secret)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
        })
    }
}

fn user_response(user: users::Model) -> UserResponse {
    UserResponse {
        user_id: user.user_id,
        username: user.username,
        email: user.email,
        created_at: user.created_at,
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), (StatusCode, Json<ErrorResponse>)> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Username and password must not be empty".to_string(),
            }),
        ));
    }

    let existing = Users::find()
        .filter(
            Condition::any()
                .add(users::Column::Username.eq(&payload.username))
                .add(users::Column::Email.eq(&payload.email)),
        )
        .one(&state.db)
        .await
        .map_err(db_error)?;

    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Username or email already registered".to_string(),
            }),
        ));
    }

    let password_hash = auth::hash_password(&payload.password).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to hash password: {}", e),
            }),
        )
    })?;

    let user = users::ActiveModel {
        user_id: NotSet,
        username: Set(payload.username),
        email: Set(payload.email),
        password_hash: Set(password_hash),
        created_at: Set(Utc::now()),
    };

    let created = Users::insert(user)
        .exec_with_returning(&state.db)
        .await
        .map_err(db_error)?;

    Ok((StatusCode::CREATED, Json(user_response(created))))
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let invalid = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid username or password".to_string(),
            }),
        )
    };

    let user = Users::find()
        .filter(users::Column::Username.eq(&form.username))
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(invalid)?;

    if !auth::verify_password(&form.password, &user.password_hash) {
        return Err(invalid());
    }

    let access_token =
        auth::create_access_token(user.user_id, &user.username, &state.config.jwt_secret)
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: format!("Failed to issue token: {}", e),
                    }),
                )
            })?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserResponse>, (StatusCode, Json<ErrorResponse>)> {
    let record = Users::find_by_id(user.user_id)
        .one(&state.db)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "User no longer exists".to_string(),
                }),
            )
        })?;

    Ok(Json(user_response(record)))
}
