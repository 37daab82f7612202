// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vision::ImageError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Body is not multipart or has no `image` field
    MissingField(String),
    /// Multipart body could not be read (includes uploads over the size limit)
    InvalidUpload(String),
    ImageDecode(String),
    ModelUnavailable(String),
    Inference(String),
    Internal(String),
}

impl ApiError {
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::MissingField(_) => "validation_error",
            ApiError::InvalidUpload(_) => "invalid_upload",
            ApiError::ImageDecode(_) => "image_decode_error",
            ApiError::ModelUnavailable(_) => "model_unavailable",
            ApiError::Inference(_) => "inference_error",
            ApiError::Internal(_) => "internal_error",
        }
    }

    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let message = match self {
            ApiError::MissingField(msg)
            | ApiError::InvalidUpload(msg)
            | ApiError::ImageDecode(msg)
            | ApiError::ModelUnavailable(msg)
            | ApiError::Inference(msg)
            | ApiError::Internal(msg) => msg.clone(),
        };

        ErrorResponse {
            error_type: self.error_type().to_string(),
            message,
            request_id,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidUpload(_) => 400,
            ApiError::MissingField(_) | ApiError::ImageDecode(_) => 422,
            ApiError::ModelUnavailable(_) => 503,
            ApiError::Inference(_) | ApiError::Internal(_) => 500,
        }
    }

    /// Render as a status code plus JSON `ErrorResponse` body
    pub fn to_http_response(&self, request_id: Option<String>) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response(request_id))).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingField(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InvalidUpload(msg) => write!(f, "Invalid upload: {}", msg),
            ApiError::ImageDecode(msg) => write!(f, "Image decode failed: {}", msg),
            ApiError::ModelUnavailable(msg) => write!(f, "Model unavailable: {}", msg),
            ApiError::Inference(msg) => write!(f, "Inference failed: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        ApiError::ImageDecode(err.to_string())
    }
}
