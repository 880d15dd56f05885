//! JWT pair issuance with account claims
//!
//! Wraps the standard pair flow of [`JwtService`]: credentials are checked,
//! then the claims are extended with the caller's username and a fixed
//! marker claim before the pair is signed.

use crate::auth::{ExtraClaims, JwtService, RequestContext};
use crate::error::ApiError;
use crate::repositories::{IdentityStore, UserRecord};
use crate::services::Authenticator;
use accounts_shared::types::{
    AccessTokenResponse, CredentialsRequest, TokenPairResponse, TokenRefreshRequest,
};
use accounts_shared::validation::{validate_credentials, validate_refresh};
use serde_json::Value;
use tracing::{debug, info};

pub const USERNAME_CLAIM: &str = "username";
pub const MARKER_CLAIM: &str = "boom";
pub const MARKER_VALUE: &str = "boom";

/// Claims added to every pair on top of the standard set
pub fn account_claims(user: &UserRecord) -> ExtraClaims {
    let mut claims = ExtraClaims::new();
    claims.insert(USERNAME_CLAIM.to_string(), Value::String(user.username.clone()));
    claims.insert(MARKER_CLAIM.to_string(), Value::String(MARKER_VALUE.to_string()));
    claims
}

/// JWT pair operations
pub struct JwtPairService;

impl JwtPairService {
    /// Exchange credentials for an access + refresh pair
    pub async fn obtain(
        identity: &dyn IdentityStore,
        jwt: &JwtService,
        req: &CredentialsRequest,
        ctx: &RequestContext,
    ) -> Result<TokenPairResponse, ApiError> {
        let credentials = validate_credentials(req)?;

        let user = Authenticator::authenticate(identity, &credentials, ctx)
            .await?
            .ok_or(ApiError::NoActiveAccount)?;

        let pair = jwt.issue_pair(user.id, account_claims(&user))?;

        metrics::counter!("accounts_jwt_pairs_issued_total").increment(1);
        info!(user_id = user.id, request_id = ?ctx.request_id, "JWT pair issued");

        Ok(TokenPairResponse {
            access: pair.access,
            refresh: pair.refresh,
        })
    }

    /// Mint a new access token from a refresh token
    pub fn refresh(
        jwt: &JwtService,
        req: &TokenRefreshRequest,
    ) -> Result<AccessTokenResponse, ApiError> {
        let refresh = validate_refresh(req)?;

        let access = jwt.refresh_access(&refresh).map_err(|e| {
            debug!(error = %e, "Rejected refresh token");
            ApiError::InvalidToken("Token is invalid or expired".to_string())
        })?;

        Ok(AccessTokenResponse { access })
    }
}
