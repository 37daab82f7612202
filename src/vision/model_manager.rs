// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption model manager for loading and sharing the BLIP bundle

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::vision::blip::{BlipLoadOptions, BlipModel, DEFAULT_INTRA_THREADS};
use crate::vision::captioner::CaptionModel;

/// Default model directory, relative to the working directory
pub const DEFAULT_MODEL_DIR: &str = "./blip_model";

/// Configuration for loading the caption model
#[derive(Debug, Clone)]
pub struct CaptionModelConfig {
    /// Path to the BLIP model directory
    pub model_dir: PathBuf,
    /// Intra-op threads per ONNX session
    pub intra_threads: usize,
    /// Optional cap on generated tokens per caption
    pub max_new_tokens: Option<usize>,
}

impl Default for CaptionModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            intra_threads: DEFAULT_INTRA_THREADS,
            max_new_tokens: None,
        }
    }
}

/// Information about the loaded caption model
#[derive(Debug, Clone)]
pub struct CaptionModelInfo {
    /// Model name
    pub name: String,
    /// Directory the model was loaded from
    pub model_dir: String,
    /// Whether the model is available
    pub available: bool,
}

/// Holds the caption model, if it loaded
///
/// Loading happens once at startup. A failed load is logged and leaves the
/// manager empty; the server keeps running and requests fail per the
/// configured error mode.
pub struct CaptionModelManager {
    model: Option<Arc<dyn CaptionModel>>,
    model_dir: String,
}

impl CaptionModelManager {
    /// Load the BLIP bundle from `config.model_dir`
    ///
    /// Never fails: load errors are logged with their cause chain.
    pub async fn new(config: CaptionModelConfig) -> Self {
        let dir = config.model_dir;
        let absolute = std::path::absolute(&dir).unwrap_or_else(|_| dir.clone());

        tracing::info!("Attempting to load model from: {}", absolute.display());

        if absolute.is_dir() {
            tracing::info!("Model directory found: {}", absolute.display());
            match list_directory(&absolute) {
                Ok(entries) => tracing::info!("Directory contents: {:?}", entries),
                Err(e) => tracing::warn!("⚠️ Could not list {}: {}", absolute.display(), e),
            }
        } else {
            tracing::error!("Model directory does not exist: {}", absolute.display());
        }

        let options = BlipLoadOptions {
            intra_threads: config.intra_threads,
            max_new_tokens: config.max_new_tokens,
        };

        let model: Option<Arc<dyn CaptionModel>> = match BlipModel::new(&dir, options).await {
            Ok(model) => {
                tracing::info!("✅ BLIP model and processor loaded successfully");
                Some(Arc::new(model))
            }
            Err(e) => {
                tracing::error!("❌ Failed to load BLIP model or processor: {:#}", e);
                None
            }
        };

        Self {
            model,
            model_dir: absolute.to_string_lossy().to_string(),
        }
    }

    /// Wrap an already-built model
    pub fn from_model(model: Arc<dyn CaptionModel>, model_dir: impl Into<String>) -> Self {
        Self {
            model: Some(model),
            model_dir: model_dir.into(),
        }
    }

    /// A manager with no model, as after a failed load
    pub fn empty() -> Self {
        Self {
            model: None,
            model_dir: String::new(),
        }
    }

    pub fn get_caption_model(&self) -> Option<Arc<dyn CaptionModel>> {
        self.model.clone()
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_info(&self) -> CaptionModelInfo {
        CaptionModelInfo {
            name: self
                .model
                .as_ref()
                .map(|m| m.name().to_string())
                .unwrap_or_else(|| "blip".to_string()),
            model_dir: self.model_dir.clone(),
            available: self.model.is_some(),
        }
    }
}

fn list_directory(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}
