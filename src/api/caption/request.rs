// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption upload extraction

use axum_extra::extract::Multipart;
use bytes::Bytes;

use crate::api::errors::ApiError;

/// Multipart field carrying the image file
pub const IMAGE_FIELD: &str = "image";

/// Uploaded image file held in memory
///
/// Filename and content type are informational only; the format is detected
/// from the bytes.
#[derive(Debug, Clone)]
pub struct CaptionUpload {
    pub bytes: Bytes,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl CaptionUpload {
    /// Read the `image` field from a multipart body, ignoring other fields
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::InvalidUpload(e.to_string()))?
        {
            if field.name() != Some(IMAGE_FIELD) {
                continue;
            }

            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidUpload(e.to_string()))?;

            return Ok(Self {
                bytes,
                filename,
                content_type,
            });
        }

        Err(ApiError::MissingField(format!(
            "multipart field '{}' is required",
            IMAGE_FIELD
        )))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}
