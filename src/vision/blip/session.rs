// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX Runtime session construction shared by the BLIP encoder and decoder

use anyhow::{Context, Result};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Default intra-op thread count for each session
pub const DEFAULT_INTRA_THREADS: usize = 4;

/// Build a CPU-only session from an ONNX file
pub fn cpu_session(model_path: &Path, intra_threads: usize) -> Result<Session> {
    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([CPUExecutionProvider::default().build()])
        .context("Failed to set CPU execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
}

/// Return the first candidate that exists under `dir`
pub fn find_model_file(dir: &Path, names: &[&str]) -> Result<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Model file not found in {}. Tried: {:?}",
                dir.display(),
                names
            )
        })
}

/// Lock a session, turning mutex poisoning into an inference error
pub fn lock_session<'a>(session: &'a Mutex<Session>, label: &str) -> Result<MutexGuard<'a, Session>> {
    session
        .lock()
        .map_err(|_| anyhow::anyhow!("{} session lock poisoned", label))
}
