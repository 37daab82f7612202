// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the BLIP vision encoder

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array4;

use super::config::BlipPreprocessorConfig;

/// Converts decoded images into encoder input tensors
///
/// Mirrors BlipImageProcessor: bicubic resize to the exact target size
/// (aspect ratio is not preserved), rescale to [0, 1], normalize with
/// mean/std, NCHW layout.
#[derive(Debug, Clone, Default)]
pub struct BlipProcessor {
    config: BlipPreprocessorConfig,
}

impl BlipProcessor {
    pub fn new(config: BlipPreprocessorConfig) -> Self {
        Self { config }
    }

    /// Preprocess an image into a `[1, 3, H, W]` tensor
    pub fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let cfg = &self.config;
        let (width, height) = (cfg.width, cfg.height);

        let resized = image.resize_exact(width, height, FilterType::CatmullRom);
        let rgb = resized.to_rgb8();

        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                let mut value = pixel[c] as f32;
                if cfg.do_rescale {
                    value *= cfg.rescale_factor;
                }
                if cfg.do_normalize {
                    value = (value - cfg.image_mean[c]) / cfg.image_std[c];
                }
                tensor[[0, c, y as usize, x as usize]] = value;
            }
        }

        tensor
    }
}
