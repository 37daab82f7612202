// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP integration for image captioning
//!
//! CPU-based captioning with BLIP exported to ONNX.
//!
//! Components:
//! - `config` - Processor and generation settings read from the model directory
//! - `preprocessing` - Image to `[1, 3, H, W]` tensor conversion
//! - `encoder` - ViT vision encoder
//! - `decoder` - Text decoder with greedy generation
//! - `model` - Combined pipeline implementing `CaptionModel`

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod model;
pub mod preprocessing;
mod session;

pub use config::{BlipGenerationConfig, BlipPreprocessorConfig};
pub use decoder::BlipDecoder;
pub use encoder::BlipEncoder;
pub use model::{BlipLoadOptions, BlipModel};
pub use preprocessing::BlipProcessor;
pub use session::DEFAULT_INTRA_THREADS;
