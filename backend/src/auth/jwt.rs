//! JWT pair issuance and validation
//!
//! Tokens are HS256-signed. A pair is minted from a refresh token's claims:
//! the access token copies every claim of the refresh token except
//! `token_type`, `exp`, `iat` and `jti`, so extra claims supplied at
//! issuance end up in both tokens.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Claims beyond the standard set, keyed by claim name
pub type ExtraClaims = serde_json::Map<String, serde_json::Value>;

/// Token type claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token id
    pub jti: String,
    pub user_id: i64,
    #[serde(flatten)]
    pub extra: ExtraClaims,
}

/// Signed access + refresh tokens
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Pre-computed JWT keys; expensive to derive, so built once and shared
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// JWT service for token operations
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl JwtService {
    /// Create a JWT service; call once at startup and keep it in `AppState`
    pub fn new(secret: &str, access_token_expiry_secs: i64, refresh_token_expiry_secs: i64) -> Self {
        Self {
            keys: JwtKeys::new(secret),
            access_lifetime: Duration::seconds(access_token_expiry_secs),
            refresh_lifetime: Duration::seconds(refresh_token_expiry_secs),
        }
    }

    /// Issue an access + refresh pair for a user
    ///
    /// `extra` is merged into the refresh token's claims before signing and
    /// carried over to the access token.
    pub fn issue_pair(&self, user_id: i64, extra: ExtraClaims) -> Result<TokenPair> {
        let refresh = self.new_claims(TokenType::Refresh, user_id, extra);
        let access = self.access_claims_from(&refresh);

        Ok(TokenPair {
            access: self.sign(&access)?,
            refresh: self.sign(&refresh)?,
        })
    }

    /// Mint a new access token from a valid refresh token
    pub fn refresh_access(&self, refresh_token: &str) -> Result<String> {
        let refresh = self.validate_typed(refresh_token, TokenType::Refresh)?;
        self.sign(&self.access_claims_from(&refresh))
    }

    /// Validate a token's signature and expiry and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &Validation::default())
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Validate an access token specifically
    #[inline]
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, TokenType::Access)
    }

    fn validate_typed(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            anyhow::bail!("Not an {} token", expected.as_str());
        }
        Ok(claims)
    }

    fn new_claims(&self, token_type: TokenType, user_id: i64, extra: ExtraClaims) -> Claims {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };

        Claims {
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id,
            extra,
        }
    }

    fn access_claims_from(&self, refresh: &Claims) -> Claims {
        self.new_claims(TokenType::Access, refresh.user_id, refresh.extra.clone())
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::default(), claims, &self.keys.encoding).map_err(|e| {
            anyhow::anyhow!(
                "Failed to generate {} token: {}",
                claims.token_type.as_str(),
                e
            )
        })
    }

    /// Access token lifetime in seconds
    #[inline]
    pub fn access_token_expiry_secs(&self) -> i64 {
        self.access_lifetime.num_seconds()
    }
}
