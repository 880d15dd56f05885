//! Authenticated user extraction
//!
//! Two schemes are accepted in the `Authorization` header:
//! - `Token <key>`: a legacy bearer token from the token store
//! - `Bearer <jwt>`: a JWT access token
//!
//! Scheme names are matched case-insensitively.

use crate::error::ApiError;
use crate::repositories::UserRecord;
use crate::state::AppState;
use axum::{
    extract::FromRef,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

/// How the caller proves their identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthScheme {
    Token,
    Jwt,
}

/// Authenticated, active user
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: UserRecord,
}

/// Split an `Authorization` value into a known scheme and its credential
fn parse_authorization(value: &str) -> Option<(AuthScheme, &str)> {
    let (scheme, credential) = value.trim().split_once(' ')?;
    let credential = credential.trim();
    if credential.is_empty() || credential.contains(' ') {
        return None;
    }
    if scheme.eq_ignore_ascii_case("token") {
        Some((AuthScheme::Token, credential))
    } else if scheme.eq_ignore_ascii_case("bearer") {
        Some((AuthScheme::Jwt, credential))
    } else {
        None
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::NotAuthenticated)?;

        let (scheme, credential) = parse_authorization(header).ok_or(ApiError::NotAuthenticated)?;

        let user_id = match scheme {
            AuthScheme::Token => {
                app_state
                    .tokens()
                    .find_by_key(credential)
                    .await?
                    .ok_or_else(|| ApiError::AuthenticationFailed("Invalid token.".to_string()))?
                    .user_id
            }
            AuthScheme::Jwt => {
                app_state
                    .jwt()
                    .validate_access_token(credential)
                    .map_err(|e| {
                        debug!(error = %e, "Rejected access token");
                        ApiError::InvalidToken(
                            "Given token not valid for any token type".to_string(),
                        )
                    })?
                    .user_id
            }
        };

        let user = app_state
            .identity()
            .find_by_id(user_id)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ApiError::AuthenticationFailed("User inactive or deleted.".to_string()))?;

        Ok(AuthUser { user })
    }
}
