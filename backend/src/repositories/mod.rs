//! Identity and token stores
//!
//! Handlers never talk to a database directly: they receive the stores as
//! trait objects through `AppState`. PostgreSQL implementations back the
//! running service; the in-memory ones back tests and `storage.backend =
//! "memory"` deployments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;
pub mod token;
pub mod user;

pub use memory::{MemoryIdentityStore, MemoryTokenStore};
pub use token::PgTokenStore;
pub use user::PgIdentityStore;

/// Store-level failures
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique column already holds the value
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(&'static str),

    #[error("record not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User record as held by the identity store
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// Input for creating a user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Column changes for an existing user; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
}

/// Opaque bearer token owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BearerToken {
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Holds user records
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create a user; fails with `Duplicate("username")` if the name is taken
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>>;

    /// Exact, case-sensitive username lookup
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>>;

    /// Apply changes to an existing user and return the updated record
    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<UserRecord>;

    async fn health_check(&self) -> StoreResult<()>;
}

/// Mints and persists legacy bearer tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Return the user's token, creating it if absent
    ///
    /// Must be atomic per user: concurrent first calls for the same user
    /// all observe the same key.
    async fn get_or_create(&self, user_id: i64) -> StoreResult<BearerToken>;

    async fn find_by_key(&self, key: &str) -> StoreResult<Option<BearerToken>>;
}

/// Generate a fresh token key (32 lowercase hex characters)
pub fn generate_key() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
