mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower::util::ServiceExt; // for `oneshot`

use common::{bridge_with, post_json, FakeChannel};
use event_bridge::request_id::{header as request_id_header, MakeReqId, XRequestId};

#[tokio::test]
async fn bridge_generates_request_id_when_missing() {
    let app = bridge_with(Arc::new(FakeChannel::default())).router();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert!(request_id.is_some(), "x-request-id should be generated");
    assert!(
        !request_id.unwrap().is_empty(),
        "request_id should not be empty"
    );
}

#[tokio::test]
async fn bridge_preserves_incoming_request_id_on_errors() {
    let app = bridge_with(Arc::new(FakeChannel::failing("down"))).router();

    let mut request = post_json("/publish", r#"{"payload":"p"}"#);
    request
        .headers_mut()
        .insert("x-request-id", "abc-123".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok());
    assert_eq!(request_id, Some("abc-123"));
}

#[tokio::test]
async fn request_id_reaches_handler_extensions() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header("x-request-id", "echo-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["request_id"], "echo-7");
}

#[tokio::test]
async fn generated_ids_are_unique() {
    let app = test_app();
    let mut seen = std::collections::HashSet::new();

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let id = response.headers()["x-request-id"]
            .to_str()
            .unwrap()
            .to_owned();
        assert!(seen.insert(id), "request ids must not repeat");
    }
}

// Bare app with just the request-id middleware stack
fn test_app() -> Router {
    use axum::middleware::from_fn;
    use tower::ServiceBuilder;
    use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

    let x_request_id = request_id_header();

    Router::new().route("/echo", get(echo_handler)).layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeReqId))
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(from_fn(
                event_bridge::request_id::push_req_id_to_extensions,
            )),
    )
}

async fn echo_handler(
    Extension(XRequestId(request_id)): Extension<XRequestId>,
) -> Json<serde_json::Value> {
    Json(json!({ "request_id": request_id }))
}
