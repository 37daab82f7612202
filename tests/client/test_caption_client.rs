// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Caption client tests against a live server on an ephemeral port

use axum::{routing::post, Router};
use caption_server::api::http_server::{serve, AppState};
use caption_server::client::{CaptionClient, ClientError};
use caption_server::config::ErrorMode;
use caption_server::vision::CaptionModel;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct EchoModel;

impl CaptionModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    fn caption(&self, image: &DynamicImage, prompt: Option<&str>) -> anyhow::Result<String> {
        let subject = format!("a {}x{} image", image.width(), image.height());
        Ok(match prompt {
            Some(p) => format!("{} {}", p, subject),
            None => subject,
        })
    }
}

fn red_png() -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([255, 0, 0])));
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Start a caption server; dropping the sender stops it
async fn spawn_server(state: AppState) -> (SocketAddr, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = serve(listener, Arc::new(state), async move {
            let _ = rx.await;
        })
        .await;
    });

    (addr, tx)
}

#[tokio::test]
async fn test_caption_bytes() {
    let (addr, _shutdown) = spawn_server(AppState::new_for_test().with_model(Arc::new(EchoModel))).await;
    let client = CaptionClient::new(format!("http://{}", addr));

    let response = client
        .caption_bytes(red_png(), "red.png", "image/png")
        .await
        .unwrap();

    assert!(response.is_complete());
    assert_eq!(
        response.caption_conditional.as_deref(),
        Some("a photography of a 32x32 image")
    );
    assert_eq!(response.caption_unconditional.as_deref(), Some("a 32x32 image"));
}

#[tokio::test]
async fn test_caption_file() {
    let (addr, _shutdown) = spawn_server(AppState::new_for_test().with_model(Arc::new(EchoModel))).await;
    let client = CaptionClient::new(format!("http://{}/", addr));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("red.png");
    std::fs::write(&path, red_png()).unwrap();

    let response = client.caption_file(&path).await.unwrap();
    assert_eq!(response.caption_unconditional.as_deref(), Some("a 32x32 image"));
}

#[tokio::test]
async fn test_legacy_failure_returns_null_pair() {
    let (addr, _shutdown) = spawn_server(AppState::new_for_test()).await;
    let client = CaptionClient::new(format!("http://{}", addr));

    let response = client
        .caption_bytes(b"not an image".to_vec(), "notes.txt", "text/plain")
        .await
        .unwrap();

    assert!(!response.is_complete());
    assert!(response.caption_conditional.is_none());
    assert!(response.caption_unconditional.is_none());
}

#[tokio::test]
async fn test_strict_failure_is_status_error() {
    let state = AppState::new_for_test().with_error_mode(ErrorMode::Strict);
    let (addr, _shutdown) = spawn_server(state).await;
    let client = CaptionClient::new(format!("http://{}", addr));

    let err = client
        .caption_bytes(red_png(), "red.png", "image/png")
        .await
        .unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 503);
            assert!(body.contains("model_unavailable"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_response() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/caption", post(|| async { "this is not json" }));
    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    let client = CaptionClient::new(format!("http://{}", addr));
    let err = client
        .caption_bytes(red_png(), "red.png", "image/png")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::MalformedResponse(_)));
    server.abort();
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let addr = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let client = CaptionClient::new(format!("http://{}", addr));

    let err = client
        .caption_bytes(red_png(), "red.png", "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
