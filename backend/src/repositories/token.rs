//! PostgreSQL token store

use super::{generate_key, BearerToken, StoreResult, TokenStore};
use async_trait::async_trait;
use sqlx::PgPool;

/// Token store backed by the `auth_tokens` table
#[derive(Clone)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn get_or_create(&self, user_id: i64) -> StoreResult<BearerToken> {
        // The UNIQUE(user_id) constraint makes the insert a no-op for a user
        // that already has a token, even under concurrent first requests.
        let inserted = sqlx::query_as::<_, BearerToken>(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING key, user_id, created_at
            "#,
        )
        .bind(generate_key())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(token) = inserted {
            return Ok(token);
        }

        let existing = sqlx::query_as::<_, BearerToken>(
            r#"
            SELECT key, user_id, created_at
            FROM auth_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(existing)
    }

    async fn find_by_key(&self, key: &str) -> StoreResult<Option<BearerToken>> {
        let token = sqlx::query_as::<_, BearerToken>(
            r#"
            SELECT key, user_id, created_at
            FROM auth_tokens
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }
}
