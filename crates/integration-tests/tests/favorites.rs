//! Favorite toggle through the HTTP surface.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use haneul_integration_tests::{TestApp, product, user};

#[tokio::test]
async fn test_toggle_twice_restores_membership() {
    let app = TestApp::new();
    let tea = product("보성 녹차", 15_000, None);
    app.backend.seed(&[tea.clone()]);
    app.sign_in(&user("김하늘", "haneul@example.com")).await;

    let status_uri = format!("/api/favorites/{}", tea.id);
    let toggle_uri = format!("/api/favorites/{}/toggle", tea.id);
    assert_eq!(app.get(&status_uri).await.data(), &json!(false));

    let first = app.post(&toggle_uri, json!({})).await;
    assert_eq!(first.data(), &json!(true));
    assert_eq!(first.toast_title(), Some("찜 목록에 추가되었습니다"));
    assert_eq!(app.get(&status_uri).await.data(), &json!(true));
    assert_eq!(
        app.get("/api/favorites").await.data().as_array().unwrap().len(),
        1
    );

    let second = app.post(&toggle_uri, json!({})).await;
    assert_eq!(second.data(), &json!(false));
    assert_eq!(app.get(&status_uri).await.data(), &json!(false));
    assert!(
        app.get("/api/favorites")
            .await
            .data()
            .as_array()
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_signed_out_toggle_shows_login_toast_and_skips_backend() {
    let app = TestApp::new();
    let tea = product("보성 녹차", 15_000, None);
    app.backend.seed(&[tea.clone()]);

    let reply = app
        .post(&format!("/api/favorites/{}/toggle", tea.id), json!({}))
        .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.toast_title(), Some("로그인이 필요합니다"));
    assert!(app.backend.calls().is_empty());
}

#[tokio::test]
async fn test_signed_out_status_is_false() {
    let app = TestApp::new();
    let tea = product("보성 녹차", 15_000, None);

    let reply = app.get(&format!("/api/favorites/{}", tea.id)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data(), &json!(false));
    assert!(app.backend.calls().is_empty());
}
