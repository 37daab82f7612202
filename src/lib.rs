// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod version;
pub mod vision;

// Re-export main types
pub use api::{create_app, ApiError, AppState, CaptionResponse, ErrorResponse};
pub use client::{CaptionClient, ClientError};
pub use config::{ConfigError, ErrorMode, ServerConfig};
pub use vision::{
    CaptionModel, CaptionModelConfig, CaptionModelManager, CaptionPair, CONDITIONAL_PROMPT,
};
