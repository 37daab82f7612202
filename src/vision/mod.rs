// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based image captioning
//!
//! This module provides:
//! - Image decoding for uploads
//! - The `CaptionModel` capability and its BLIP implementation
//! - Startup loading of the shared model bundle
//!
//! Inference runs on CPU through ONNX Runtime.

pub mod blip;
pub mod captioner;
pub mod image_utils;
pub mod model_manager;

pub use captioner::{CaptionModel, CaptionPair, CONDITIONAL_PROMPT};
pub use image_utils::{decode_image_bytes, ImageError, ImageInfo};
pub use model_manager::{CaptionModelConfig, CaptionModelInfo, CaptionModelManager, DEFAULT_MODEL_DIR};
