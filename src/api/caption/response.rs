// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Caption response types

use serde::{Deserialize, Serialize};

use crate::vision::CaptionPair;

/// Response from `POST /caption`
///
/// Both fields are always serialized; on failure both are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionResponse {
    /// Caption continuing "a photography of"
    pub caption_conditional: Option<String>,
    /// Caption from the image alone
    pub caption_unconditional: Option<String>,
}

impl CaptionResponse {
    pub fn null_pair() -> Self {
        Self::default()
    }

    /// True when both captions are present
    pub fn is_complete(&self) -> bool {
        self.caption_conditional.is_some() && self.caption_unconditional.is_some()
    }
}

impl From<CaptionPair> for CaptionResponse {
    fn from(pair: CaptionPair) -> Self {
        Self {
            caption_conditional: Some(pair.conditional),
            caption_unconditional: Some(pair.unconditional),
        }
    }
}
