//! Account routes
//!
//! Registration, legacy token and JWT endpoints plus the authenticated
//! `/me` resource. Handlers stay thin: extract, call one service, respond.

use crate::auth::{AuthUser, RequestContext};
use crate::error::{ApiError, ApiResult};
use crate::services::{AuthTokenService, JwtPairService, UserService};
use crate::state::AppState;
use accounts_shared::types::{
    AccessTokenResponse, AuthTokenResponse, CredentialsRequest, RegisterRequest, RegisteredUser,
    TokenPairResponse, TokenRefreshRequest, UpdateUserRequest, UserSummary,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

/// Create account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(obtain_auth_token))
        .route("/token/jwt", post(obtain_token_pair))
        .route("/token/jwt/refresh", post(refresh_token_pair))
        .route("/me", get(get_me).patch(update_me))
}

/// Unwrap a JSON body, turning parse failures into a 400 with a detail
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::MalformedBody(rejection.body_text()))
}

/// Register a new user
///
/// POST {base}/register
async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisteredUser>)> {
    let req = json_body(payload)?;
    let user = UserService::register(state.identity(), &req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for the legacy bearer token
///
/// POST {base}/token
async fn obtain_auth_token(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<AuthTokenResponse>> {
    let req = json_body(payload)?;
    let response = AuthTokenService::obtain(state.identity(), state.tokens(), &req, &ctx).await?;
    Ok(Json(response))
}

/// Exchange credentials for a JWT access + refresh pair
///
/// POST {base}/token/jwt
async fn obtain_token_pair(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPairResponse>> {
    let req = json_body(payload)?;
    let pair = JwtPairService::obtain(state.identity(), state.jwt(), &req, &ctx).await?;
    Ok(Json(pair))
}

/// POST {base}/token/jwt/refresh
async fn refresh_token_pair(
    State(state): State<AppState>,
    payload: Result<Json<TokenRefreshRequest>, JsonRejection>,
) -> ApiResult<Json<AccessTokenResponse>> {
    let req = json_body(payload)?;
    Ok(Json(JwtPairService::refresh(state.jwt(), &req)?))
}

/// GET {base}/me
async fn get_me(auth: AuthUser) -> Json<UserSummary> {
    Json(UserService::summary(&auth.user))
}

/// Update the authenticated user
///
/// PATCH {base}/me
async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<Json<RegisteredUser>> {
    let req = json_body(payload)?;
    let user = UserService::update(state.identity(), &auth.user, &req).await?;
    Ok(Json(user))
}
