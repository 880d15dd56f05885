//! Credential verification against the identity store

use crate::auth::{PasswordService, RequestContext};
use crate::error::ApiResult;
use crate::repositories::{IdentityStore, UserRecord};
use accounts_shared::types::AuthCredentials;
use tracing::{debug, info};

/// Why a credential check failed; only ever logged, never shown to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    UnknownUser,
    WrongPassword,
    Inactive,
}

impl Rejection {
    fn as_str(self) -> &'static str {
        match self {
            Rejection::UnknownUser => "unknown_user",
            Rejection::WrongPassword => "wrong_password",
            Rejection::Inactive => "inactive",
        }
    }
}

/// Authenticates credential pairs
pub struct Authenticator;

impl Authenticator {
    /// Return the active user matching the credentials, or `None`
    ///
    /// Unknown usernames still pay for one password hash so that response
    /// timing does not reveal which usernames exist. Errors are reserved for
    /// store or hashing failures.
    pub async fn authenticate(
        identity: &dyn IdentityStore,
        credentials: &AuthCredentials,
        ctx: &RequestContext,
    ) -> ApiResult<Option<UserRecord>> {
        let outcome = match identity.find_by_username(&credentials.username).await? {
            None => {
                PasswordService::burn_async(credentials.password.clone()).await?;
                Err(Rejection::UnknownUser)
            }
            Some(user) => {
                let valid = PasswordService::verify_async(
                    credentials.password.clone(),
                    user.password_hash.clone(),
                )
                .await?;
                if !valid {
                    Err(Rejection::WrongPassword)
                } else if !user.is_active {
                    Err(Rejection::Inactive)
                } else {
                    Ok(user)
                }
            }
        };

        match outcome {
            Ok(user) => {
                debug!(
                    user_id = user.id,
                    client_ip = ?ctx.client_ip,
                    request_id = ?ctx.request_id,
                    "Credentials verified"
                );
                Ok(Some(user))
            }
            Err(reason) => {
                metrics::counter!(
                    "accounts_authentication_failures_total",
                    "reason" => reason.as_str()
                )
                .increment(1);
                info!(
                    username = %credentials.username,
                    reason = reason.as_str(),
                    client_ip = ?ctx.client_ip,
                    request_id = ?ctx.request_id,
                    "Authentication failed"
                );
                Ok(None)
            }
        }
    }
}
