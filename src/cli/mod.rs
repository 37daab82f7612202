// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Command-line arguments for the server and the caption client binaries

use clap::Parser;
use std::path::PathBuf;

use crate::client::DEFAULT_SERVICE_URL;
use crate::config::{
    ErrorMode, ServerConfig, DEFAULT_HOST, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT,
};
use crate::vision::blip::DEFAULT_INTRA_THREADS;
use crate::vision::DEFAULT_MODEL_DIR;

/// BLIP image caption server
#[derive(Parser, Debug)]
#[command(name = "caption-server")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "HTTP service that captions uploaded images with BLIP", long_about = None)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "CAPTION_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "CAPTION_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory holding the exported BLIP model
    #[arg(long, env = "CAPTION_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: PathBuf,

    /// How request failures are reported
    #[arg(long, env = "CAPTION_ERROR_MODE", value_enum, default_value_t = ErrorMode::Legacy)]
    pub error_mode: ErrorMode,

    /// Maximum request body size in bytes
    #[arg(long, env = "CAPTION_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Intra-op threads per ONNX session
    #[arg(long, env = "CAPTION_INTRA_THREADS", default_value_t = DEFAULT_INTRA_THREADS)]
    pub intra_threads: usize,

    /// Cap on generated tokens per caption (defaults to the model's max_length)
    #[arg(long, env = "CAPTION_MAX_NEW_TOKENS")]
    pub max_new_tokens: Option<usize>,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        Self {
            host: args.host,
            port: args.port,
            model_dir: args.model_dir,
            error_mode: args.error_mode,
            max_upload_bytes: args.max_upload_bytes,
            intra_threads: args.intra_threads,
            max_new_tokens: args.max_new_tokens,
        }
    }
}

/// Caption a local image with a running caption server
#[derive(Parser, Debug)]
#[command(name = "caption-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Send an image to a caption server and print the captions", long_about = None)]
pub struct CaptionCliArgs {
    /// Image file to caption
    pub image: PathBuf,

    /// Caption server base URL
    #[arg(long, env = "CAPTIONING_SERVICE_URL", default_value = DEFAULT_SERVICE_URL)]
    pub url: String,

    /// Print the raw JSON response
    #[arg(long)]
    pub json: bool,
}
