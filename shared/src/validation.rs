//! Input validation for account requests
//!
//! Field checks return `Result<(), String>` with a client-facing message;
//! the request-level functions collect those messages into [`FieldErrors`]
//! keyed by field name.

use crate::errors::FieldErrors;
use crate::types::{
    AuthCredentials, CredentialsRequest, RegisterRequest, TextField, TokenRefreshRequest,
    UpdateUserRequest,
};
use validator::ValidateEmail;

pub const USERNAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 5;
pub const PASSWORD_MAX_LENGTH: usize = 128;
pub const EMAIL_MAX_LENGTH: usize = 254;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const BLANK_MESSAGE: &str = "This field may not be blank.";
pub const NULL_MESSAGE: &str = "This field may not be null.";
pub const NOT_A_STRING_MESSAGE: &str = "Not a valid string.";

/// A registration that passed field validation
#[derive(Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl std::fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidRegistration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// An update that passed field validation; `None` means "leave as is"
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ValidUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
}

impl std::fmt::Debug for ValidUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidUpdate")
            .field("username", &self.username)
            .field("password_changed", &self.password.is_some())
            .field("email", &self.email)
            .finish()
    }
}

fn min_length_message(min: usize) -> String {
    format!("Ensure this field has at least {} characters.", min)
}

fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// Validate username length and character set
///
/// Letters, digits and `@ . + - _` are accepted; letters may be any
/// Unicode alphabetic character.
pub fn validate_username(username: &str) -> Result<(), Vec<String>> {
    let mut messages = Vec::new();
    if username.chars().count() > USERNAME_MAX_LENGTH {
        messages.push(max_length_message(USERNAME_MAX_LENGTH));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if !username.chars().all(allowed) {
        messages.push(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(messages)
    }
}

/// Validate password length
///
/// Length is counted in characters, not bytes.
pub fn validate_password(password: &str) -> Result<(), Vec<String>> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LENGTH {
        return Err(vec![min_length_message(PASSWORD_MIN_LENGTH)]);
    }
    if len > PASSWORD_MAX_LENGTH {
        return Err(vec![max_length_message(PASSWORD_MAX_LENGTH)]);
    }
    Ok(())
}

/// Validate an email address; the empty string means "no email"
pub fn validate_email(email: &str) -> Result<(), Vec<String>> {
    if email.is_empty() {
        return Ok(());
    }
    let mut messages = Vec::new();
    if email.chars().count() > EMAIL_MAX_LENGTH {
        messages.push(max_length_message(EMAIL_MAX_LENGTH));
    }
    if !email.validate_email() {
        messages.push("Enter a valid email address.".to_string());
    }
    if messages.is_empty() {
        Ok(())
    } else {
        Err(messages)
    }
}

/// The string carried by a field, reporting null and non-string values
fn supplied<'a>(errors: &mut FieldErrors, field: &str, value: &'a TextField) -> Option<&'a str> {
    match value {
        TextField::Missing => None,
        TextField::Null => {
            errors.add(field, NULL_MESSAGE);
            None
        }
        TextField::Invalid => {
            errors.add(field, NOT_A_STRING_MESSAGE);
            None
        }
        TextField::Text(raw) => Some(raw),
    }
}

/// Presence check for a required string field
///
/// Surrounding whitespace is stripped only when `trim` is set. A value that
/// is empty (after optional trimming) is reported as blank.
fn required(errors: &mut FieldErrors, field: &str, value: &TextField, trim: bool) -> Option<String> {
    if value.is_missing() {
        errors.add(field, REQUIRED_MESSAGE);
        return None;
    }
    let raw = supplied(errors, field, value)?;
    let cleaned = if trim { raw.trim() } else { raw };
    if cleaned.is_empty() {
        errors.add(field, BLANK_MESSAGE);
        return None;
    }
    Some(cleaned.to_string())
}

fn check(errors: &mut FieldErrors, field: &str, result: Result<(), Vec<String>>) -> bool {
    match result {
        Ok(()) => true,
        Err(messages) => {
            for message in messages {
                errors.add(field, message);
            }
            false
        }
    }
}

/// Validate a registration request
///
/// Username and password are both trimmed before their length checks, and
/// the trimmed password is the one stored.
pub fn validate_registration(req: &RegisterRequest) -> Result<ValidRegistration, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = required(&mut errors, "username", &req.username, true)
        .filter(|u| check(&mut errors, "username", validate_username(u)));
    let password = required(&mut errors, "password", &req.password, true)
        .filter(|p| check(&mut errors, "password", validate_password(p)));
    let email = supplied(&mut errors, "email", &req.email)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    check(&mut errors, "email", validate_email(&email));

    match (username, password) {
        (Some(username), Some(password)) if errors.is_empty() => Ok(ValidRegistration {
            username,
            password,
            email,
        }),
        _ => Err(errors),
    }
}

/// Validate a partial update; only supplied fields are checked
pub fn validate_update(req: &UpdateUserRequest) -> Result<ValidUpdate, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut update = ValidUpdate::default();

    if !req.username.is_missing() {
        update.username = required(&mut errors, "username", &req.username, true)
            .filter(|u| check(&mut errors, "username", validate_username(u)));
    }
    if !req.password.is_missing() {
        update.password = required(&mut errors, "password", &req.password, true)
            .filter(|p| check(&mut errors, "password", validate_password(p)));
    }
    if let Some(email) = supplied(&mut errors, "email", &req.email) {
        let email = email.trim().to_string();
        if check(&mut errors, "email", validate_email(&email)) {
            update.email = Some(email);
        }
    }

    errors.into_result(update)
}

/// Validate a credential pair for authentication
///
/// The username is trimmed; the password is not, so a password made only of
/// whitespace is accepted here and left to the credential check.
pub fn validate_credentials(req: &CredentialsRequest) -> Result<AuthCredentials, FieldErrors> {
    let mut errors = FieldErrors::new();
    let username = required(&mut errors, "username", &req.username, true);
    let password = required(&mut errors, "password", &req.password, false);

    match (username, password) {
        (Some(username), Some(password)) => Ok(AuthCredentials { username, password }),
        _ => Err(errors),
    }
}

/// Validate a refresh request, returning the trimmed refresh token
pub fn validate_refresh(req: &TokenRefreshRequest) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    match required(&mut errors, "refresh", &req.refresh, true) {
        Some(token) => Ok(token),
        None => Err(errors),
    }
}
