//! Legacy opaque token issuance

use crate::auth::RequestContext;
use crate::error::ApiError;
use crate::repositories::{IdentityStore, TokenStore};
use crate::services::{Authenticator, UserService};
use accounts_shared::types::{AuthTokenResponse, CredentialsRequest};
use accounts_shared::validation::validate_credentials;
use tracing::info;

pub const UNABLE_TO_AUTHENTICATE: &str = "Unable to authenticate with provided credentials.";

/// Legacy token operations
pub struct AuthTokenService;

impl AuthTokenService {
    /// Exchange credentials for the user's bearer token
    ///
    /// The token is created on first use and returned unchanged afterwards;
    /// tokens are never rotated.
    pub async fn obtain(
        identity: &dyn IdentityStore,
        tokens: &dyn TokenStore,
        req: &CredentialsRequest,
        ctx: &RequestContext,
    ) -> Result<AuthTokenResponse, ApiError> {
        let credentials = validate_credentials(req)?;

        let user = Authenticator::authenticate(identity, &credentials, ctx)
            .await?
            .ok_or_else(|| ApiError::Authorization(UNABLE_TO_AUTHENTICATE.to_string()))?;

        let token = tokens.get_or_create(user.id).await?;

        metrics::counter!("accounts_auth_tokens_issued_total").increment(1);
        info!(user_id = user.id, request_id = ?ctx.request_id, "Auth token issued");

        Ok(AuthTokenResponse {
            token: token.key,
            user: UserService::summary(&user),
        })
    }
}
