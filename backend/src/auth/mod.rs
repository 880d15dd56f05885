//! Authentication module
//!
//! Argon2 password hashing, JWT pair issuance, the per-request
//! authentication context and the authenticated-user extractor.

mod context;
mod jwt;
mod middleware;
mod password;

pub use context::RequestContext;
pub use jwt::{Claims, ExtraClaims, JwtService, TokenPair, TokenType};
pub use middleware::AuthUser;
pub use password::PasswordService;
