// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Captioning capability shared by the HTTP layer and model implementations

use anyhow::{Context, Result};
use image::DynamicImage;

/// Text prefix used for the conditional caption
pub const CONDITIONAL_PROMPT: &str = "a photography of";

/// Conditional and unconditional captions for one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionPair {
    /// Caption continuing [`CONDITIONAL_PROMPT`] (prefix included)
    pub conditional: String,
    /// Caption generated from the image alone
    pub unconditional: String,
}

/// A loaded, read-only captioning model
///
/// Implementations are blocking; callers on the async runtime should drive
/// them from `spawn_blocking`.
pub trait CaptionModel: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Caption an RGB image, optionally continuing a text prompt
    fn caption(&self, image: &DynamicImage, prompt: Option<&str>) -> Result<String>;

    /// Run the conditional pass, then the unconditional pass
    fn caption_pair(&self, image: &DynamicImage) -> Result<CaptionPair> {
        let conditional = self
            .caption(image, Some(CONDITIONAL_PROMPT))
            .context("Conditional caption failed")?;
        let unconditional = self
            .caption(image, None)
            .context("Unconditional caption failed")?;

        Ok(CaptionPair {
            conditional,
            unconditional,
        })
    }
}
