// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod caption;
pub mod errors;
pub mod http_server;

pub use caption::{caption_handler, CaptionResponse, CaptionUpload};
pub use errors::{ApiError, ErrorResponse};
pub use http_server::{create_app, serve, start_server, AppState};
