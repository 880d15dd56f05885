//! Application state management
//!
//! The shared state handed to every request handler via Axum's state
//! extraction. It carries the identity store, the token store and the JWT
//! issuer as injected dependencies; handlers never reach for globals.
//! All fields are Arc-backed, so cloning per request is O(1).

use crate::auth::JwtService;
use crate::config::AppConfig;
use crate::repositories::{
    IdentityStore, MemoryIdentityStore, MemoryTokenStore, PgIdentityStore, PgTokenStore,
    TokenStore,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    pub identity: Arc<dyn IdentityStore>,
    pub tokens: Arc<dyn TokenStore>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    /// Prometheus render handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state from explicit stores
    ///
    /// Pre-computes the JWT keys from the configured secret, so call this
    /// once at startup.
    pub fn new(
        config: AppConfig,
        identity: Arc<dyn IdentityStore>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        let jwt = JwtService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry_secs,
            config.jwt.refresh_token_expiry_secs,
        );

        Self {
            config: Arc::new(config),
            identity,
            tokens,
            jwt,
            metrics: None,
        }
    }

    /// State backed by PostgreSQL stores sharing one pool
    pub fn with_postgres(config: AppConfig, pool: PgPool) -> Self {
        Self::new(
            config,
            Arc::new(PgIdentityStore::new(pool.clone())),
            Arc::new(PgTokenStore::new(pool)),
        )
    }

    /// State backed by fresh, empty in-memory stores
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryIdentityStore::new()),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    /// Attach the Prometheus handle served on `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    #[inline]
    pub fn identity(&self) -> &dyn IdentityStore {
        self.identity.as_ref()
    }

    #[inline]
    pub fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }
}
