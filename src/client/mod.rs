// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP client for a caption server
//!
//! Forwards an image as multipart field `image` to `{base_url}/caption` and
//! reads the snake_case JSON reply. Transport failures, non-success statuses
//! and malformed bodies are reported as distinct errors.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::caption::{CaptionResponse, IMAGE_FIELD};

/// Environment variable naming the caption server base URL
pub const SERVICE_URL_ENV: &str = "CAPTIONING_SERVICE_URL";

pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No file uploaded")]
    EmptyUpload,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error calling captioning service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Captioning service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Error parsing response from captioning service: {0}")]
    MalformedResponse(String),
}

/// Client for `POST /caption`
#[derive(Debug, Clone)]
pub struct CaptionClient {
    http: reqwest::Client,
    base_url: String,
}

impl CaptionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Use `CAPTIONING_SERVICE_URL`, falling back to `http://localhost:8000`
    pub fn from_env() -> Self {
        let url = std::env::var(SERVICE_URL_ENV).unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
        Self::new(url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self) -> String {
        format!("{}/caption", self.base_url)
    }

    /// Caption an in-memory image
    pub async fn caption_bytes(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<CaptionResponse, ClientError> {
        if bytes.is_empty() {
            return Err(ClientError::EmptyUpload);
        }

        info!(
            "Sending {} ({}, {} bytes) to {}",
            filename,
            content_type,
            bytes.len(),
            self.endpoint()
        );

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part(IMAGE_FIELD, part);

        let response = self.http.post(self.endpoint()).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!("Captioning service replied {}: {}", status, body);

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::MalformedResponse(e.to_string()))
    }

    /// Caption a file on disk; the content type is guessed from the extension
    pub async fn caption_file(&self, path: impl AsRef<Path>) -> Result<CaptionResponse, ClientError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        self.caption_bytes(bytes, &filename, content_type_for(path))
            .await
    }
}

/// MIME type for common image extensions
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
