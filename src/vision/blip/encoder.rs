// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP vision encoder
//!
//! Runs the ViT image tower and returns the patch embeddings that the text
//! decoder cross-attends to.

use anyhow::{Context, Result};
use ndarray::{Array3, Array4, Ix3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::session::{cpu_session, lock_session};

/// Candidate file names for the vision graph, in lookup order
pub const ENCODER_FILE_NAMES: &[&str] = &[
    "vision_model.onnx",
    "onnx/vision_model.onnx",
    "encoder.onnx",
];

/// BLIP vision encoder session
#[derive(Clone)]
pub struct BlipEncoder {
    session: Arc<Mutex<Session>>,
    input_name: String,
}

impl std::fmt::Debug for BlipEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipEncoder")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl BlipEncoder {
    /// Load the vision encoder from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime rejects it.
    pub fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("BLIP vision encoder not found: {}", model_path.display());
        }

        info!("Loading BLIP vision encoder from {}", model_path.display());

        let session = cpu_session(model_path, intra_threads)
            .context("Failed to load BLIP vision encoder")?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        debug!("Vision encoder input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    /// Encode a preprocessed `[1, 3, H, W]` tensor into `[1, seq_len, hidden]` embeddings
    pub fn encode(&self, pixel_values: &Array4<f32>) -> Result<Array3<f32>> {
        let shape = pixel_values.shape();
        if shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let input_value = Value::from_array(pixel_values.to_owned())
            .context("Failed to create pixel_values tensor")?;

        let mut session = lock_session(&self.session, "encoder")?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .context("Encoder inference failed")?;

        let hidden = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract encoder output")?;

        debug!("Encoder output shape: {:?}", hidden.shape());

        hidden
            .to_owned()
            .into_dimensionality::<Ix3>()
            .context("Unexpected encoder output rank, expected [batch, seq_len, hidden]")
    }
}
