//! Accounts Shared Library
//!
//! Request/response types, field errors and input validation shared by the
//! accounts backend and its API clients.

pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
