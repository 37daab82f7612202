// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP processor and generation settings
//!
//! Both are read from the JSON files exported next to the ONNX graphs
//! (`preprocessor_config.json`, `config.json`, `generation_config.json`).
//! Every file is optional; missing files or fields fall back to the
//! `blip-image-captioning-base` values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Input resolution of the BLIP vision transformer
pub const BLIP_IMAGE_SIZE: u32 = 384;

/// OpenAI CLIP normalization mean (used by BlipImageProcessor)
pub const CLIP_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// OpenAI CLIP normalization std
pub const CLIP_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// `[DEC]` token that starts every BLIP decoder sequence
pub const DEFAULT_BOS_TOKEN_ID: u32 = 30522;

/// `[SEP]` token, which BLIP uses as end of caption
pub const DEFAULT_SEP_TOKEN_ID: u32 = 102;

/// Total decoder sequence length (prompt included), matching `generate()` defaults
pub const DEFAULT_MAX_LENGTH: usize = 20;

/// `size` is either a bare edge length or a `{height, width}` object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SizeField {
    Edge(u32),
    HeightWidth { height: u32, width: u32 },
}

#[derive(Debug, Default, Deserialize)]
struct RawPreprocessorConfig {
    image_size: Option<u32>,
    size: Option<SizeField>,
    image_mean: Option<[f32; 3]>,
    image_std: Option<[f32; 3]>,
    rescale_factor: Option<f32>,
    do_rescale: Option<bool>,
    do_normalize: Option<bool>,
}

/// Image preprocessing settings
#[derive(Debug, Clone, PartialEq)]
pub struct BlipPreprocessorConfig {
    pub height: u32,
    pub width: u32,
    pub image_mean: [f32; 3],
    pub image_std: [f32; 3],
    pub rescale_factor: f32,
    pub do_rescale: bool,
    pub do_normalize: bool,
}

impl Default for BlipPreprocessorConfig {
    fn default() -> Self {
        Self {
            height: BLIP_IMAGE_SIZE,
            width: BLIP_IMAGE_SIZE,
            image_mean: CLIP_MEAN,
            image_std: CLIP_STD,
            rescale_factor: 1.0 / 255.0,
            do_rescale: true,
            do_normalize: true,
        }
    }
}

impl BlipPreprocessorConfig {
    /// Load `preprocessor_config.json` from the model directory, or defaults if absent
    pub fn load(model_dir: &Path) -> Result<Self> {
        let path = model_dir.join("preprocessor_config.json");
        if !path.exists() {
            debug!("No preprocessor_config.json, using BLIP defaults");
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawPreprocessorConfig = serde_json::from_str(text)?;
        let defaults = Self::default();

        let (height, width) = match (raw.size, raw.image_size) {
            (Some(SizeField::HeightWidth { height, width }), _) => (height, width),
            (Some(SizeField::Edge(edge)), _) | (None, Some(edge)) => (edge, edge),
            (None, None) => (defaults.height, defaults.width),
        };

        if height == 0 || width == 0 {
            anyhow::bail!("image size must be non-zero, got {}x{}", width, height);
        }

        Ok(Self {
            height,
            width,
            image_mean: raw.image_mean.unwrap_or(defaults.image_mean),
            image_std: raw.image_std.unwrap_or(defaults.image_std),
            rescale_factor: raw.rescale_factor.unwrap_or(defaults.rescale_factor),
            do_rescale: raw.do_rescale.unwrap_or(defaults.do_rescale),
            do_normalize: raw.do_normalize.unwrap_or(defaults.do_normalize),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawTokenIds {
    bos_token_id: Option<u32>,
    sep_token_id: Option<u32>,
    max_length: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawModelConfig {
    #[serde(default)]
    text_config: RawTokenIds,
}

#[derive(Debug, Default, Deserialize)]
struct RawGenerationConfig {
    max_length: Option<usize>,
    bos_token_id: Option<u32>,
    // BLIP stops on [SEP]; `generate()` passes sep_token_id as eos
    sep_token_id: Option<u32>,
}

/// Greedy decoding settings
#[derive(Debug, Clone, PartialEq)]
pub struct BlipGenerationConfig {
    pub bos_token_id: u32,
    pub sep_token_id: u32,
    /// Maximum decoder sequence length, prompt tokens included
    pub max_length: usize,
    /// Optional cap on newly generated tokens, applied on top of `max_length`
    pub max_new_tokens: Option<usize>,
}

impl Default for BlipGenerationConfig {
    fn default() -> Self {
        Self {
            bos_token_id: DEFAULT_BOS_TOKEN_ID,
            sep_token_id: DEFAULT_SEP_TOKEN_ID,
            max_length: DEFAULT_MAX_LENGTH,
            max_new_tokens: None,
        }
    }
}

impl BlipGenerationConfig {
    /// Merge `config.json` (text_config) and `generation_config.json`, the latter winning
    pub fn load(model_dir: &Path) -> Result<Self> {
        let mut config = Self::default();

        let model_config_path = model_dir.join("config.json");
        if model_config_path.exists() {
            let text = std::fs::read_to_string(&model_config_path)
                .with_context(|| format!("Failed to read {}", model_config_path.display()))?;
            let raw: RawModelConfig = serde_json::from_str(&text)
                .with_context(|| format!("Invalid {}", model_config_path.display()))?;
            config.apply_text_config(raw.text_config);
        }

        let generation_path = model_dir.join("generation_config.json");
        if generation_path.exists() {
            let text = std::fs::read_to_string(&generation_path)
                .with_context(|| format!("Failed to read {}", generation_path.display()))?;
            let raw: RawGenerationConfig = serde_json::from_str(&text)
                .with_context(|| format!("Invalid {}", generation_path.display()))?;
            config.apply_generation_config(raw);
        }

        debug!(
            "Generation config - BOS: {}, SEP: {}, max_length: {}",
            config.bos_token_id, config.sep_token_id, config.max_length
        );

        Ok(config)
    }

    fn apply_text_config(&mut self, raw: RawTokenIds) {
        if let Some(id) = raw.bos_token_id {
            self.bos_token_id = id;
        }
        if let Some(id) = raw.sep_token_id {
            self.sep_token_id = id;
        }
        if let Some(len) = raw.max_length {
            self.max_length = len;
        }
    }

    fn apply_generation_config(&mut self, raw: RawGenerationConfig) {
        if let Some(id) = raw.bos_token_id {
            self.bos_token_id = id;
        }
        if let Some(id) = raw.sep_token_id {
            self.sep_token_id = id;
        }
        if let Some(len) = raw.max_length {
            self.max_length = len;
        }
    }

    pub fn with_max_new_tokens(mut self, max_new_tokens: Option<usize>) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    /// Number of tokens that may still be generated after a prompt of `prompt_len` tokens
    pub fn generation_budget(&self, prompt_len: usize) -> usize {
        let by_length = self.max_length.saturating_sub(prompt_len);
        match self.max_new_tokens {
            Some(cap) => by_length.min(cap),
            None => by_length,
        }
    }
}
