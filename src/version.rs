// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the caption server

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-blip-onnx-2026-10-19";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2026-10-19";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "blip-captioning",
    "conditional-caption",
    "unconditional-caption",
    "onnx-cpu",
    "strict-error-mode",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Caption Server {} ({})", VERSION_NUMBER, BUILD_DATE)
}
