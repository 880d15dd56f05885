//! Router-level tests for the account endpoints
//!
//! Drive the full router (middleware included) against in-memory stores.

use crate::config::AppConfig;
use crate::routes::create_router;
use crate::services::jwt_pair::{MARKER_CLAIM, MARKER_VALUE, USERNAME_CLAIM};
use crate::state::AppState;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use tower::ServiceExt;

const BASE: &str = "/api/v1/accounts";

struct TestApp {
    app: Router,
    state: AppState,
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::in_memory(AppConfig::for_tests());
        let app = create_router(state.clone());
        Self { app, state }
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        authorization: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", BASE, path));
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = builder.body(body.unwrap_or_else(Body::empty)).unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, path, Some(Body::from(body.to_string())), None)
            .await
    }

    async fn get_auth(&self, path: &str, authorization: &str) -> (StatusCode, Value) {
        self.request(Method::GET, path, None, Some(authorization)).await
    }

    async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post(
            "/register",
            json!({ "username": username, "password": password }),
        )
        .await
    }

    async fn legacy_token(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post("/token", json!({ "username": username, "password": password }))
            .await
    }

    async fn jwt_pair(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.post("/token/jwt", json!({ "username": username, "password": password }))
            .await
    }
}

// ----------------------------------------------------------------------------
// Registration
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_register_returns_username_only() {
    let app = TestApp::new();
    let (status, body) = app.register("alice", "hunter22").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "username": "alice" }));
}

#[tokio::test]
async fn test_register_short_password() {
    let app = TestApp::new();
    let (status, body) = app.register("alice", "abcd").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "password": ["Ensure this field has at least 5 characters."] })
    );
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = TestApp::new();
    let (status, _) = app.register("alice", "hunter22").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.register("alice", "another-pass").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "username": ["A user with that username already exists."] })
    );
}

#[tokio::test]
async fn test_register_missing_fields() {
    let app = TestApp::new();
    let (status, body) = app.post("/register", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["username"], json!(["This field is required."]));
    assert_eq!(body["password"], json!(["This field is required."]));
}

#[tokio::test]
async fn test_register_invalid_email() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/register",
            json!({ "username": "alice", "password": "hunter22", "email": "nope" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("email").is_some());
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = TestApp::new();
    let (status, body) = app
        .request(
            Method::POST,
            "/register",
            Some(Body::from("{not json")),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

// ----------------------------------------------------------------------------
// Legacy token
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_legacy_token_is_idempotent() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;

    let (status, first) = app.legacy_token("alice", "hunter22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        first["user"],
        json!({ "id": 1, "username": "alice", "email": "" })
    );
    let key = first["token"].as_str().unwrap();
    assert_eq!(key.len(), 32);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

    let (status, second) = app.legacy_token("alice", "hunter22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["token"], second["token"]);
}

#[tokio::test]
async fn test_legacy_token_wrong_password() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;

    let (status, body) = app.legacy_token("alice", "hunter23").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "non_field_errors": ["Unable to authenticate with provided credentials."] })
    );
}

#[tokio::test]
async fn test_legacy_token_unknown_user() {
    let app = TestApp::new();
    let (status, body) = app.legacy_token("ghost", "hunter22").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("non_field_errors").is_some());
}

#[tokio::test]
async fn test_legacy_token_requires_both_fields() {
    let app = TestApp::new();
    let (status, body) = app.post("/token", json!({ "username": "alice" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "password": ["This field is required."] }));
}

#[tokio::test]
async fn test_registration_stores_trimmed_password() {
    let app = TestApp::new();
    let (status, _) = app.register("alice", "  spaced  ").await;
    assert_eq!(status, StatusCode::CREATED);

    // The legacy endpoint does not trim, so only the trimmed form matches
    let (status, _) = app.legacy_token("alice", "  spaced  ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.legacy_token("alice", "spaced").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_whitespace_passwords_rejected() {
    let app = TestApp::new();

    let (status, body) = app.register("alice", "     ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "password": ["This field may not be blank."] }));

    let (status, body) = app.register("alice", " abc ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "password": ["Ensure this field has at least 5 characters."] })
    );
}

#[tokio::test]
async fn test_register_null_and_mistyped_fields() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/register",
            json!({ "username": null, "password": ["hunter22"], "email": true }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "username": ["This field may not be null."],
            "password": ["Not a valid string."],
            "email": ["Not a valid string."],
        })
    );
}

#[tokio::test]
async fn test_register_numeric_fields_coerced() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/register", json!({ "username": 123, "password": 123456 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "username": "123" }));

    let (status, _) = app.legacy_token("123", "123456").await;
    assert_eq!(status, StatusCode::OK);
}

// ----------------------------------------------------------------------------
// JWT pair
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_jwt_pair_contains_custom_claims() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;

    let (status, body) = app.jwt_pair("alice", "hunter22").await;
    assert_eq!(status, StatusCode::OK);

    let access = body["access"].as_str().unwrap();
    let claims = app.state.jwt().validate_access_token(access).unwrap();
    assert_eq!(claims.user_id, 1);
    assert_eq!(claims.extra.get(USERNAME_CLAIM), Some(&json!("alice")));
    assert_eq!(claims.extra.get(MARKER_CLAIM), Some(&json!(MARKER_VALUE)));
    assert!(body["refresh"].is_string());
}

#[tokio::test]
async fn test_jwt_pair_bad_credentials() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;

    let (status, body) = app.jwt_pair("alice", "wrong-pass").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "no_active_account");
}

#[tokio::test]
async fn test_jwt_refresh() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;
    let (_, pair) = app.jwt_pair("alice", "hunter22").await;

    let (status, body) = app
        .post("/token/jwt/refresh", json!({ "refresh": pair["refresh"] }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let claims = app
        .state
        .jwt()
        .validate_access_token(body["access"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.extra.get(USERNAME_CLAIM), Some(&json!("alice")));

    let (status, body) = app
        .post("/token/jwt/refresh", json!({ "refresh": pair["access"] }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_not_valid");
}

// ----------------------------------------------------------------------------
// Authenticated user
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_me_with_legacy_token_and_jwt() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;
    let (_, token) = app.legacy_token("alice", "hunter22").await;
    let (_, pair) = app.jwt_pair("alice", "hunter22").await;

    let expected = json!({ "id": 1, "username": "alice", "email": "" });

    let auth = format!("Token {}", token["token"].as_str().unwrap());
    let (status, body) = app.get_auth("/me", &auth).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);

    let auth = format!("Bearer {}", pair["access"].as_str().unwrap());
    let (status, body) = app.get_auth("/me", &auth).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, expected);
}

#[tokio::test]
async fn test_me_rejects_missing_and_invalid_credentials() {
    let app = TestApp::new();

    let (status, body) = app.request(Method::GET, "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "not_authenticated");

    let (status, _) = app.get_auth("/me", "Token 0123456789abcdef0123456789abcdef").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.get_auth("/me", "Bearer invalid.token.here").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_not_valid");
}

#[tokio::test]
async fn test_update_password_via_me() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;
    let (_, token) = app.legacy_token("alice", "hunter22").await;
    let auth = format!("Token {}", token["token"].as_str().unwrap());

    let (status, body) = app
        .request(
            Method::PATCH,
            "/me",
            Some(Body::from(json!({ "password": "brand-new" }).to_string())),
            Some(&auth),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "username": "alice" }));

    let (status, _) = app.legacy_token("alice", "hunter22").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Same token: changing the password does not rotate it
    let (status, again) = app.legacy_token("alice", "brand-new").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["token"], token["token"]);
}

#[tokio::test]
async fn test_update_rejects_whitespace_password() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;
    let (_, token) = app.legacy_token("alice", "hunter22").await;
    let auth = format!("Token {}", token["token"].as_str().unwrap());

    let (status, body) = app
        .request(
            Method::PATCH,
            "/me",
            Some(Body::from(json!({ "password": "      " }).to_string())),
            Some(&auth),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "password": ["This field may not be blank."] }));

    let (status, _) = app.legacy_token("alice", "hunter22").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_update_rejects_short_password() {
    let app = TestApp::new();
    app.register("alice", "hunter22").await;
    let (_, token) = app.legacy_token("alice", "hunter22").await;
    let auth = format!("Token {}", token["token"].as_str().unwrap());

    let (status, body) = app
        .request(
            Method::PATCH,
            "/me",
            Some(Body::from(json!({ "password": "abc" }).to_string())),
            Some(&auth),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("password").is_some());
}

// ----------------------------------------------------------------------------
// Operational endpoints
// ----------------------------------------------------------------------------

#[tokio::test]
async fn test_ready_and_metrics_without_recorder() {
    let app = TestApp::new();

    let response = app
        .app
        .clone()
        .oneshot(Request::get("/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Property: any wrong password yields 400 with a non-field error
    #[test]
    fn prop_wrong_password_never_issues_token(password in "[a-zA-Z0-9 ]{1,24}") {
        prop_assume!(password != "hunter22");

        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let app = TestApp::new();
            app.register("alice", "hunter22").await;

            let (status, body) = app.legacy_token("alice", &password).await;
            prop_assert_eq!(status, StatusCode::BAD_REQUEST);
            prop_assert!(body.get("non_field_errors").is_some());
            Ok(())
        })?;
    }
}
