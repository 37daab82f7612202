// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP captioning pipeline
//!
//! Combines the image processor, the ViT vision encoder and the BERT-style
//! text decoder into a single [`CaptionModel`].

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::Array3;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::config::{BlipGenerationConfig, BlipPreprocessorConfig};
use super::decoder::{BlipDecoder, DECODER_FILE_NAMES};
use super::encoder::{BlipEncoder, ENCODER_FILE_NAMES};
use super::preprocessing::BlipProcessor;
use super::session::{find_model_file, DEFAULT_INTRA_THREADS};
use crate::vision::captioner::{CaptionModel, CaptionPair, CONDITIONAL_PROMPT};

/// Knobs applied while loading a BLIP bundle
#[derive(Debug, Clone, PartialEq)]
pub struct BlipLoadOptions {
    /// Intra-op threads for each ONNX session
    pub intra_threads: usize,
    /// Optional cap on generated tokens per caption
    pub max_new_tokens: Option<usize>,
}

impl Default for BlipLoadOptions {
    fn default() -> Self {
        Self {
            intra_threads: DEFAULT_INTRA_THREADS,
            max_new_tokens: None,
        }
    }
}

/// BLIP model bundle, immutable after load
#[derive(Clone)]
pub struct BlipModel {
    processor: BlipProcessor,
    encoder: BlipEncoder,
    decoder: BlipDecoder,
    model_dir: String,
}

impl std::fmt::Debug for BlipModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipModel")
            .field("model_dir", &self.model_dir)
            .field("processor", &self.processor)
            .finish_non_exhaustive()
    }
}

impl BlipModel {
    /// Load a BLIP bundle from local files only
    ///
    /// Expected files:
    /// - `vision_model.onnx` (or `onnx/vision_model.onnx`, `encoder.onnx`)
    /// - `text_decoder_model.onnx` (or `onnx/text_decoder_model.onnx`,
    ///   `decoder_model.onnx`, `decoder.onnx`)
    /// - `tokenizer.json`
    /// - optional `preprocessor_config.json`, `config.json`, `generation_config.json`
    ///
    /// # Errors
    /// Returns error if:
    /// - Model directory doesn't exist
    /// - Required model files are missing
    /// - A config file is present but malformed
    /// - ONNX Runtime initialization fails
    pub async fn new<P: AsRef<Path>>(model_dir: P, options: BlipLoadOptions) -> Result<Self> {
        let model_dir = model_dir.as_ref();

        if !model_dir.exists() {
            anyhow::bail!("BLIP model directory not found: {}", model_dir.display());
        }

        info!("Loading BLIP models from {}", model_dir.display());

        let processor_config = BlipPreprocessorConfig::load(model_dir)
            .context("Failed to load image processor config")?;
        let generation_config = BlipGenerationConfig::load(model_dir)
            .context("Failed to load generation config")?
            .with_max_new_tokens(options.max_new_tokens);

        let encoder_path = find_model_file(model_dir, ENCODER_FILE_NAMES)?;
        let decoder_path = find_model_file(model_dir, DECODER_FILE_NAMES)?;
        let tokenizer_path = model_dir.join("tokenizer.json");

        let encoder = BlipEncoder::new(&encoder_path, options.intra_threads)
            .context("Failed to load BLIP encoder")?;
        let decoder = BlipDecoder::new(
            &decoder_path,
            &tokenizer_path,
            generation_config,
            options.intra_threads,
        )
        .context("Failed to load BLIP decoder")?;

        info!(
            "✅ BLIP pipeline ready ({}x{} input, CPU-only)",
            processor_config.width, processor_config.height
        );

        Ok(Self {
            processor: BlipProcessor::new(processor_config),
            encoder,
            decoder,
            model_dir: model_dir.to_string_lossy().to_string(),
        })
    }

    /// Preprocess and encode an image into vision embeddings
    pub fn encode_image(&self, image: &DynamicImage) -> Result<Array3<f32>> {
        let pixel_values = self.processor.preprocess(image);
        debug!("Preprocessed image shape: {:?}", pixel_values.shape());

        self.encoder
            .encode(&pixel_values)
            .context("Failed to encode image")
    }

    /// Generate and decode a caption from precomputed embeddings
    pub fn caption_embeddings(&self, image_embeds: &Array3<f32>, prompt: Option<&str>) -> Result<String> {
        let start = Instant::now();

        let tokens = self
            .decoder
            .generate(image_embeds, prompt)
            .context("Failed to generate caption tokens")?;
        let text = self.decoder.decode(&tokens)?;

        debug!(
            "Generated {} tokens in {}ms (prompt: {:?})",
            tokens.len(),
            start.elapsed().as_millis(),
            prompt
        );

        Ok(text)
    }
}

impl CaptionModel for BlipModel {
    fn name(&self) -> &str {
        "blip"
    }

    fn caption(&self, image: &DynamicImage, prompt: Option<&str>) -> Result<String> {
        let embeds = self.encode_image(image)?;
        self.caption_embeddings(&embeds, prompt)
    }

    /// Both passes share one encoder run; the image tower ignores the prompt
    fn caption_pair(&self, image: &DynamicImage) -> Result<CaptionPair> {
        let start = Instant::now();
        let embeds = self.encode_image(image)?;

        let conditional = self
            .caption_embeddings(&embeds, Some(CONDITIONAL_PROMPT))
            .context("Conditional caption failed")?;
        let unconditional = self
            .caption_embeddings(&embeds, None)
            .context("Unconditional caption failed")?;

        info!("BLIP captions complete in {}ms", start.elapsed().as_millis());

        Ok(CaptionPair {
            conditional,
            unconditional,
        })
    }
}
