//! PostgreSQL identity store

use super::{IdentityStore, NewUser, StoreError, StoreResult, UserChanges, UserRecord};
use async_trait::async_trait;
use sqlx::PgPool;

/// Identity store backed by the `users` table
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation to `Duplicate(field)`
pub(crate) fn unique_violation(err: sqlx::Error, field: &'static str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Duplicate(field),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, is_active, date_joined
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "username"))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, is_active, date_joined
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT id, username, email, password_hash, is_active, date_joined
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, password_hash, is_active, date_joined
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "username"))?
        .ok_or(StoreError::NotFound)
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::db::health_check(&self.pool)
            .await
            .map_err(StoreError::Other)
    }
}
