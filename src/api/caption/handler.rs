// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption endpoint handler

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use std::sync::Arc;
use tracing::{error, info, Instrument, Span};
use uuid::Uuid;

use super::request::CaptionUpload;
use super::response::CaptionResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::config::ErrorMode;
use crate::vision::{decode_image_bytes, CaptionPair};

/// POST /caption - Caption an uploaded image
///
/// Accepts a multipart body with an `image` file field and returns a
/// conditional caption (continuing "a photography of") and an unconditional
/// one. How failures surface depends on the configured [`ErrorMode`].
pub async fn caption_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("caption", request_id = %request_id);

    async move {
        match caption_upload(&state, multipart).await {
            Ok(response) => Json(response).into_response(),
            Err(err) => {
                error!("Error processing image: {}", err);
                failure_response(state.error_mode, &err, request_id)
            }
        }
    }
    .instrument(span)
    .await
}

async fn caption_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<CaptionResponse, ApiError> {
    let multipart = multipart.map_err(|e| {
        ApiError::MissingField(format!("expected a multipart/form-data body: {}", e))
    })?;
    let upload = CaptionUpload::from_multipart(multipart).await?;

    info!(
        "Received image: filename={:?}, content_type={:?}, size={} bytes",
        upload.filename,
        upload.content_type,
        upload.size()
    );

    let manager = state.caption_model_manager.clone();
    let span = Span::current();

    let pair = tokio::task::spawn_blocking(move || -> Result<CaptionPair, ApiError> {
        let _guard = span.enter();

        let (image, image_info) = decode_image_bytes(&upload.bytes)?;
        info!(
            "Decoded {:?} image {}x{}",
            image_info.format, image_info.width, image_info.height
        );

        let model = manager.get_caption_model().ok_or_else(|| {
            ApiError::ModelUnavailable("Caption model is not loaded".to_string())
        })?;

        model
            .caption_pair(&image)
            .map_err(|e| ApiError::Inference(format!("{:#}", e)))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Caption task failed: {}", e)))??;

    info!("Conditional caption: {}", pair.conditional);
    info!("Unconditional caption: {}", pair.unconditional);

    Ok(pair.into())
}

/// Missing or non-multipart bodies are always rejected; everything else
/// follows the error mode
fn failure_response(mode: ErrorMode, err: &ApiError, request_id: String) -> Response {
    match (mode, err) {
        (_, ApiError::MissingField(_)) | (ErrorMode::Strict, _) => {
            err.to_http_response(Some(request_id))
        }
        (ErrorMode::Legacy, _) => Json(CaptionResponse::null_pair()).into_response(),
    }
}
