//! In-memory identity and token stores
//!
//! Each store keeps its state behind a single tokio mutex, so every
//! operation (including token get-or-create) is atomic.

use super::{
    generate_key, BearerToken, IdentityStore, NewUser, StoreError, StoreResult, TokenStore,
    UserChanges, UserRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Users {
    last_id: i64,
    by_id: HashMap<i64, UserRecord>,
    id_by_username: HashMap<String, i64>,
}

/// Identity store holding users in process memory
#[derive(Default)]
pub struct MemoryIdentityStore {
    users: Mutex<Users>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, user: NewUser) -> StoreResult<UserRecord> {
        let mut users = self.users.lock().await;
        if users.id_by_username.contains_key(&user.username) {
            return Err(StoreError::Duplicate("username"));
        }

        users.last_id += 1;
        let record = UserRecord {
            id: users.last_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_active: true,
            date_joined: Utc::now(),
        };
        users.id_by_username.insert(record.username.clone(), record.id);
        users.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.lock().await.by_id.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<UserRecord>> {
        let users = self.users.lock().await;
        Ok(users
            .id_by_username
            .get(username)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }

    async fn update(&self, id: i64, changes: UserChanges) -> StoreResult<UserRecord> {
        let mut users = self.users.lock().await;
        let Users {
            by_id,
            id_by_username,
            ..
        } = &mut *users;

        let record = by_id.get_mut(&id).ok_or(StoreError::NotFound)?;

        if let Some(username) = changes.username {
            if username != record.username {
                if id_by_username.contains_key(&username) {
                    return Err(StoreError::Duplicate("username"));
                }
                id_by_username.remove(&record.username);
                id_by_username.insert(username.clone(), id);
                record.username = username;
            }
        }
        if let Some(email) = changes.email {
            record.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            record.password_hash = password_hash;
        }
        if let Some(is_active) = changes.is_active {
            record.is_active = is_active;
        }

        Ok(record.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Token store holding one token per user in process memory
#[derive(Default)]
pub struct MemoryTokenStore {
    by_user: Mutex<HashMap<i64, BearerToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get_or_create(&self, user_id: i64) -> StoreResult<BearerToken> {
        let mut by_user = self.by_user.lock().await;
        let token = by_user.entry(user_id).or_insert_with(|| BearerToken {
            key: generate_key(),
            user_id,
            created_at: Utc::now(),
        });
        Ok(token.clone())
    }

    async fn find_by_key(&self, key: &str) -> StoreResult<Option<BearerToken>> {
        let by_user = self.by_user.lock().await;
        Ok(by_user.values().find(|t| t.key == key).cloned())
    }
}
