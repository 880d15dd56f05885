//! User registration and profile updates
//!
//! Password hashing runs on the blocking thread pool; the identity store
//! only ever sees hashes.

use crate::auth::PasswordService;
use crate::error::ApiError;
use crate::repositories::{IdentityStore, NewUser, UserChanges, UserRecord};
use accounts_shared::types::{RegisterRequest, RegisteredUser, UpdateUserRequest, UserSummary};
use accounts_shared::validation::{validate_registration, validate_update};
use tracing::info;

/// User account operations
pub struct UserService;

impl UserService {
    /// Register a new user
    ///
    /// Fails with `Validation` for bad fields and `Uniqueness` when the
    /// username is already taken. The response never contains the password.
    pub async fn register(
        identity: &dyn IdentityStore,
        req: &RegisterRequest,
    ) -> Result<RegisteredUser, ApiError> {
        let valid = validate_registration(req)?;

        let password_hash = PasswordService::hash_async(valid.password)
            .await
            .map_err(ApiError::Internal)?;

        let user = identity
            .create(NewUser {
                username: valid.username,
                email: valid.email,
                password_hash,
            })
            .await?;

        metrics::counter!("accounts_users_registered_total").increment(1);
        info!(user_id = user.id, username = %user.username, "User registered");

        Ok(RegisteredUser {
            username: user.username,
        })
    }

    /// Apply a partial update to an existing user
    ///
    /// A supplied password is re-hashed before it is stored; other fields
    /// are written as given.
    pub async fn update(
        identity: &dyn IdentityStore,
        user: &UserRecord,
        req: &UpdateUserRequest,
    ) -> Result<RegisteredUser, ApiError> {
        let valid = validate_update(req)?;

        let password_hash = match valid.password {
            Some(password) => Some(
                PasswordService::hash_async(password)
                    .await
                    .map_err(ApiError::Internal)?,
            ),
            None => None,
        };
        let password_changed = password_hash.is_some();

        let updated = identity
            .update(
                user.id,
                UserChanges {
                    username: valid.username,
                    email: valid.email,
                    password_hash,
                    is_active: None,
                },
            )
            .await?;

        info!(user_id = updated.id, password_changed, "User updated");

        Ok(RegisteredUser {
            username: updated.username,
        })
    }

    /// Public summary of a user record
    pub fn summary(user: &UserRecord) -> UserSummary {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}
