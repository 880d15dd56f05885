//! API request and response types
//!
//! Request fields are [`TextField`]s so that a missing, null or mistyped
//! field is reported as a validation message against that field instead of
//! failing deserialization of the whole body.

use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A string field as it arrived in a JSON body
///
/// Numbers are accepted and kept in their decimal form; booleans, arrays and
/// objects are `Invalid`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TextField {
    #[default]
    Missing,
    Null,
    Text(String),
    Invalid,
}

impl TextField {
    pub fn is_missing(&self) -> bool {
        matches!(self, TextField::Missing)
    }

    /// The carried string, if the field holds one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TextField::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for TextField {
    fn from(value: &str) -> Self {
        TextField::Text(value.to_string())
    }
}

impl From<String> for TextField {
    fn from(value: String) -> Self {
        TextField::Text(value)
    }
}

impl Serialize for TextField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TextField::Text(value) => serializer.serialize_str(value),
            _ => serializer.serialize_none(),
        }
    }
}

struct TextFieldVisitor;

impl<'de> Visitor<'de> for TextFieldVisitor {
    type Value = TextField;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<TextField, E> {
        Ok(TextField::Text(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<TextField, E> {
        Ok(TextField::Text(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<TextField, E> {
        Ok(TextField::Text(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<TextField, E> {
        Ok(TextField::Text(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<TextField, E> {
        Ok(TextField::Text(value.to_string()))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<TextField, E> {
        Ok(TextField::Invalid)
    }

    fn visit_unit<E: de::Error>(self) -> Result<TextField, E> {
        Ok(TextField::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<TextField, E> {
        Ok(TextField::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<TextField, D::Error> {
        deserializer.deserialize_any(TextFieldVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TextField, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(TextField::Invalid)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<TextField, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(TextField::Invalid)
    }
}

impl<'de> Deserialize<'de> for TextField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TextFieldVisitor)
    }
}

/// Registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: TextField,
    #[serde(default, skip_serializing_if = "TextField::is_missing")]
    pub password: TextField,
    #[serde(default, skip_serializing_if = "TextField::is_missing")]
    pub email: TextField,
}

/// Partial user update request; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default, skip_serializing_if = "TextField::is_missing")]
    pub username: TextField,
    #[serde(default, skip_serializing_if = "TextField::is_missing")]
    pub password: TextField,
    #[serde(default, skip_serializing_if = "TextField::is_missing")]
    pub email: TextField,
}

/// Public view of a registered user (the password is write-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
}

/// Credential pair as posted by the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: TextField,
    #[serde(default)]
    pub password: TextField,
}

/// Validated credential pair, alive for a single authentication attempt
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// User summary embedded in the legacy token response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Legacy token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub token: String,
    pub user: UserSummary,
}

/// JWT access + refresh pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// JWT refresh request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRefreshRequest {
    #[serde(default)]
    pub refresh: TextField,
}

/// Response to a JWT refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
