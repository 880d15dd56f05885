//! Business logic services
//!
//! Each service validates its input, calls the stores it is handed and
//! shapes the response; none of them holds state of its own.

pub mod auth_token;
pub mod authentication;
pub mod jwt_pair;
pub mod user;

pub use auth_token::AuthTokenService;
pub use authentication::Authenticator;
pub use jwt_pair::JwtPairService;
pub use user::UserService;
