// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Server configuration
//!
//! Values come from CLI flags with environment fallbacks (see `cli::ServerArgs`).

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

use crate::vision::blip::DEFAULT_INTRA_THREADS;
use crate::vision::{CaptionModelConfig, DEFAULT_MODEL_DIR};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid bind address '{0}'")]
    InvalidHost(String),

    #[error("Port must be greater than 0")]
    ZeroPort,

    #[error("Upload limit must be greater than 0")]
    ZeroUploadLimit,

    #[error("Intra-op thread count must be greater than 0")]
    ZeroThreads,

    #[error("max_new_tokens must be greater than 0 when set")]
    ZeroMaxNewTokens,
}

/// How request failures are reported to clients
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorMode {
    /// 200 with both captions null
    #[default]
    Legacy,
    /// Distinct status code with a JSON error body
    Strict,
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMode::Legacy => write!(f, "legacy"),
            ErrorMode::Strict => write!(f, "strict"),
        }
    }
}

/// Caption server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub model_dir: PathBuf,
    pub error_mode: ErrorMode,
    pub max_upload_bytes: usize,
    pub intra_threads: usize,
    pub max_new_tokens: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            error_mode: ErrorMode::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            intra_threads: DEFAULT_INTRA_THREADS,
            max_new_tokens: None,
        }
    }
}

impl ServerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.host
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;

        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }
        if self.intra_threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.max_new_tokens == Some(0) {
            return Err(ConfigError::ZeroMaxNewTokens);
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .host
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Settings for the model loader
    pub fn model_config(&self) -> CaptionModelConfig {
        CaptionModelConfig {
            model_dir: self.model_dir.clone(),
            intra_threads: self.intra_threads,
            max_new_tokens: self.max_new_tokens,
        }
    }
}
