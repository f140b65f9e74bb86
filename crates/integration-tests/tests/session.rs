//! Login, session restore, logout and the admin gate.

#![allow(clippy::unwrap_used)]

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::{Value, json};

use haneul_integration_tests::{TestApp, user};
use haneul_storefront::config::AdminConfig;

#[tokio::test]
async fn test_login_restore_logout() {
    let app = TestApp::new();
    let shopper = user("김하늘", "haneul@example.com");

    assert!(app.get("/api/auth/session").await.data().is_null());

    let login = app.sign_in(&shopper).await;
    assert_eq!(login.data()["name"], "김하늘");
    assert_eq!(login.toast_title(), Some("로그인되었습니다"));
    assert!(
        login.body["toast"]["description"]
            .as_str()
            .unwrap()
            .contains("김하늘")
    );

    let session = app.get("/api/auth/session").await;
    assert_eq!(session.data()["id"], json!(shopper.id));

    let logout = app.post("/api/auth/logout", json!({})).await;
    assert_eq!(logout.data(), &json!(true));
    assert!(app.get("/api/auth/session").await.data().is_null());
    assert_eq!(app.get("/api/cart").await.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_failed_login_keeps_current_session() {
    let app = TestApp::new();
    let shopper = user("김하늘", "haneul@example.com");
    app.sign_in(&shopper).await;

    let rejected = app
        .post(
            "/api/auth/login",
            json!({ "email": "haneul@example.com", "password": "nope" }),
        )
        .await;
    assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
    assert_eq!(rejected.toast_title(), Some("로그인에 실패했습니다"));

    let session = app.get("/api/auth/session").await;
    assert_eq!(session.data()["id"], json!(shopper.id));
}

#[tokio::test]
async fn test_malformed_email() {
    let app = TestApp::new();
    let reply = app
        .post(
            "/api/auth/login",
            json!({ "email": "haneul-at-example", "password": "whatever" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.toast_title(), Some("이메일을 확인해주세요"));
    assert!(app.backend.calls().is_empty());
}

fn admin_config(password: &str) -> AdminConfig {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .unwrap()
        .to_string();
    AdminConfig {
        username: "admin".to_string(),
        password_hash: SecretString::from(hash),
    }
}

#[tokio::test]
async fn test_admin_gate() {
    let app = TestApp::with_admin(Some(admin_config("haneul-admin-2024!")));

    assert_eq!(app.get("/api/admin/status").await.data(), &json!(false));

    let wrong = app
        .post(
            "/api/admin/login",
            json!({ "username": "admin", "password": "guess" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/admin/status").await.data(), &json!(false));

    let ok = app
        .post(
            "/api/admin/login",
            json!({ "username": "admin", "password": "haneul-admin-2024!" }),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(app.get("/api/admin/status").await.data(), &json!(true));

    app.post("/api/admin/logout", json!({})).await;
    assert_eq!(app.get("/api/admin/status").await.data(), &json!(false));
}

#[tokio::test]
async fn test_admin_disabled_without_credentials() {
    let app = TestApp::new();
    let reply = app
        .post(
            "/api/admin/login",
            json!({ "username": "admin", "password": "anything" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["toast"]["variant"], Value::from("destructive"));
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let reply = app.get("/health").await;
    assert_eq!(reply.status, StatusCode::OK);
}
