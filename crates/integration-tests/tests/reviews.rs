//! Review pre-checks.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use haneul_integration_tests::{TestApp, product, user};
use haneul_storefront::backend::memory::Op;
use haneul_storefront::models::Review;

fn shipping() -> serde_json::Value {
    json!({
        "recipient": "김하늘",
        "phone": "010-1234-5678",
        "address": "서울시 마포구 월드컵로 1",
    })
}

#[tokio::test]
async fn test_review_without_purchase_is_rejected() {
    let app = TestApp::new();
    let honey = product("지리산 꿀", 33_000, None);
    app.backend.seed(&[honey.clone()]);
    app.sign_in(&user("김하늘", "haneul@example.com")).await;

    let reply = app
        .post(
            &format!("/api/products/{}/reviews", honey.id),
            json!({ "rating": 5, "content": "달아요" }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        reply.body["toast"]["description"],
        "구매한 상품만 리뷰를 작성할 수 있습니다"
    );
    assert_eq!(app.backend.writes("reviews"), 0);
}

#[tokio::test]
async fn test_purchase_then_review_then_duplicate() {
    let app = TestApp::new();
    let honey = product("지리산 꿀", 33_000, None);
    app.backend.seed(&[honey.clone()]);
    app.sign_in(&user("김하늘", "haneul@example.com")).await;

    app.post("/api/cart", json!({ "product_id": honey.id, "quantity": 1 }))
        .await;
    assert_eq!(app.post("/api/orders", shipping()).await.status, StatusCode::OK);

    let uri = format!("/api/products/{}/reviews", honey.id);
    app.backend.clear_calls();
    let created = app.post(&uri, json!({ "rating": 5, "content": "달아요" })).await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.toast_title(), Some("리뷰가 등록되었습니다"));

    let sequence: Vec<_> = app
        .backend
        .calls()
        .into_iter()
        .map(|call| (call.op, call.table))
        .collect();
    assert_eq!(
        sequence,
        vec![
            (Op::Select, Some("orders")),
            (Op::Select, Some("order_items")),
            (Op::Select, Some("reviews")),
            (Op::Insert, Some("reviews")),
        ]
    );

    let duplicate = app.post(&uri, json!({ "rating": 4, "content": "또 샀어요" })).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.toast_title(), Some("이미 리뷰를 작성하셨습니다"));
    assert_eq!(app.backend.rows::<Review>().len(), 1);

    let listed = app.get(&uri).await;
    assert_eq!(listed.data().as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_rating_out_of_range() {
    let app = TestApp::new();
    let honey = product("지리산 꿀", 33_000, None);
    app.sign_in(&user("김하늘", "haneul@example.com")).await;
    app.backend.clear_calls();

    let reply = app
        .post(
            &format!("/api/products/{}/reviews", honey.id),
            json!({ "rating": 0, "content": "별로" }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.toast_title(), Some("별점을 확인해주세요"));
    assert!(app.backend.calls().is_empty());
}
