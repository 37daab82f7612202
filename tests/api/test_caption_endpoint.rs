// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Caption endpoint tests
//!
//! These tests verify that POST /caption:
//! - Is the only registered route
//! - Returns both captions for a valid image
//! - Runs the conditional pass with "a photography of" and the unconditional pass with no prompt
//! - Is deterministic for the same image
//! - Ignores declared content type and extra multipart fields

use axum::http::{Method, Request, StatusCode};
use axum::body::Body;
use caption_server::api::http_server::{create_app, AppState};
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use super::helpers::{
    image_request, multipart_body, caption_request, read_json, red_png, StubModel, BOUNDARY,
};

fn state_with_stub() -> (AppState, Arc<StubModel>) {
    let model = Arc::new(StubModel::default());
    let state = AppState::new_for_test().with_model(model.clone());
    (state, model)
}

#[tokio::test]
async fn test_caption_red_square() {
    let (state, _) = state_with_stub();
    let app = create_app(Arc::new(state));

    let response = app.oneshot(image_request(&red_png(32, 32))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json.as_object().unwrap().len(), 2);

    let conditional = json["caption_conditional"].as_str().unwrap();
    let unconditional = json["caption_unconditional"].as_str().unwrap();
    assert_eq!(conditional, "a photography of a 32x32 red square");
    assert_eq!(unconditional, "a 32x32 red square");
    assert!(conditional.chars().all(|c| c.is_ascii_graphic() || c == ' '));
}

#[tokio::test]
async fn test_prompts_passed_to_model() {
    let (state, model) = state_with_stub();
    let app = create_app(Arc::new(state));

    let response = app.oneshot(image_request(&red_png(8, 8))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let prompts = model.prompts.lock().unwrap().clone();
    assert_eq!(prompts, vec![Some("a photography of".to_string()), None]);
}

#[tokio::test]
async fn test_same_image_same_captions() {
    let (state, _) = state_with_stub();
    let app = create_app(Arc::new(state));
    let png = red_png(32, 32);

    let first = read_json(app.clone().oneshot(image_request(&png)).await.unwrap()).await;
    let second = read_json(app.oneshot(image_request(&png)).await.unwrap()).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_declared_content_type_ignored() {
    let (state, _) = state_with_stub();
    let app = create_app(Arc::new(state));

    let body = multipart_body("image", "upload.bin", "application/octet-stream", &red_png(16, 16));
    let response = app.oneshot(caption_request(body)).await.unwrap();

    let json = read_json(response).await;
    assert_eq!(json["caption_unconditional"], "a 16x16 red square");
}

#[tokio::test]
async fn test_extra_fields_ignored() {
    let (state, _) = state_with_stub();
    let app = create_app(Arc::new(state));

    let mut body = format!(
        "--{}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n",
        BOUNDARY
    )
    .into_bytes();
    body.extend(multipart_body("image", "red.png", "image/png", &red_png(4, 4)));

    let response = app.oneshot(caption_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["caption_unconditional"], "a 4x4 red square");
}

#[tokio::test]
async fn test_concurrent_requests() {
    let (state, model) = state_with_stub();
    let app = create_app(Arc::new(state));
    let png = red_png(32, 32);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let app = app.clone();
            let png = png.clone();
            tokio::spawn(async move { app.oneshot(image_request(&png)).await.unwrap() })
        })
        .collect();

    for handle in handles {
        let json = read_json(handle.await.unwrap()).await;
        assert_eq!(json["caption_conditional"], "a photography of a 32x32 red square");
    }
    assert_eq!(model.prompts.lock().unwrap().len(), 16);
}

#[tokio::test]
async fn test_get_not_allowed() {
    let app = create_app(Arc::new(AppState::new_for_test()));
    let req = Request::builder()
        .method(Method::GET)
        .uri("/caption")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_no_other_routes() {
    let app = create_app(Arc::new(AppState::new_for_test()));

    for path in ["/health", "/", "/v1/caption"] {
        let req = Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {}", path);
    }
}
