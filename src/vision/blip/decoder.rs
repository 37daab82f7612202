// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! BLIP text decoder
//!
//! Greedy autoregressive generation over the exported text decoder graph.
//! Every step re-runs the full token sequence (the export has no KV cache);
//! BLIP captions are short enough that this stays cheap.

use anyhow::{Context, Result};
use ndarray::{s, Array2, Array3, Ix3};
use ort::session::Session;
use ort::value::{DynValue, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::{debug, info};

use super::config::BlipGenerationConfig;
use super::session::{cpu_session, lock_session};

/// Candidate file names for the text decoder graph, in lookup order
pub const DECODER_FILE_NAMES: &[&str] = &[
    "text_decoder_model.onnx",
    "onnx/text_decoder_model.onnx",
    "decoder_model.onnx",
    "decoder.onnx",
];

const INPUT_IDS: &str = "input_ids";
const ATTENTION_MASK: &str = "attention_mask";
const ENCODER_HIDDEN_STATES: &str = "encoder_hidden_states";
const ENCODER_ATTENTION_MASK: &str = "encoder_attention_mask";

const SUPPORTED_INPUTS: &[&str] = &[
    INPUT_IDS,
    ATTENTION_MASK,
    ENCODER_HIDDEN_STATES,
    ENCODER_ATTENTION_MASK,
];

/// BLIP text decoder session plus tokenizer
#[derive(Clone)]
pub struct BlipDecoder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    input_names: Vec<String>,
    config: BlipGenerationConfig,
}

impl std::fmt::Debug for BlipDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlipDecoder")
            .field("input_names", &self.input_names)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BlipDecoder {
    /// Load the text decoder and its tokenizer
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found
    /// - ONNX Runtime rejects the graph
    /// - The graph expects inputs this decoder cannot feed (e.g. KV cache exports)
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        tokenizer_path: P,
        config: BlipGenerationConfig,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("BLIP text decoder not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("BLIP tokenizer not found: {}", tokenizer_path.display());
        }

        info!("Loading BLIP text decoder from {}", model_path.display());

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        info!("Loaded tokenizer with {} tokens", tokenizer.get_vocab_size(true));

        let session = cpu_session(model_path, intra_threads)
            .context("Failed to load BLIP text decoder")?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        debug!("Decoder inputs: {:?}", input_names);
        validate_decoder_inputs(&input_names)?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            input_names,
            config,
        })
    }

    /// Starting sequence: `[DEC]` followed by the prompt tokens, if any
    pub fn prompt_tokens(&self, prompt: Option<&str>) -> Result<Vec<u32>> {
        prompt_tokens(&self.tokenizer, &self.config, prompt)
    }

    /// Generate a token sequence from encoder embeddings
    ///
    /// The returned sequence includes the starting tokens; generation stops at
    /// the separator token (not included) or when the length budget runs out.
    pub fn generate(&self, image_embeds: &Array3<f32>, prompt: Option<&str>) -> Result<Vec<u32>> {
        let tokens = self.prompt_tokens(prompt)?;
        let budget = self.config.generation_budget(tokens.len());

        debug!(
            "Starting generation with {} initial tokens, budget {}",
            tokens.len(),
            budget
        );

        greedy_decode(tokens, budget, self.config.sep_token_id, |seq| {
            self.forward(image_embeds, seq)
        })
    }

    /// Convert tokens to text with special tokens stripped
    pub fn decode(&self, tokens: &[u32]) -> Result<String> {
        let text = self
            .tokenizer
            .decode(tokens, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;
        Ok(text.trim().to_string())
    }

    /// Run the decoder once and return the logits of the last position
    fn forward(&self, image_embeds: &Array3<f32>, tokens: &[u32]) -> Result<Vec<f32>> {
        let seq_len = tokens.len();
        let enc_len = image_embeds.shape()[1];

        let mut inputs: Vec<(String, DynValue)> = Vec::with_capacity(self.input_names.len());
        for name in &self.input_names {
            let value = match name.as_str() {
                INPUT_IDS => {
                    let ids: Vec<i64> = tokens.iter().map(|&t| t as i64).collect();
                    Value::from_array(Array2::from_shape_vec((1, seq_len), ids)?)?.into_dyn()
                }
                ATTENTION_MASK => Value::from_array(Array2::<i64>::ones((1, seq_len)))?.into_dyn(),
                ENCODER_HIDDEN_STATES => Value::from_array(image_embeds.to_owned())?.into_dyn(),
                ENCODER_ATTENTION_MASK => {
                    Value::from_array(Array2::<i64>::ones((1, enc_len)))?.into_dyn()
                }
                other => anyhow::bail!("Unsupported decoder input '{}'", other),
            };
            inputs.push((name.clone(), value));
        }

        let mut session = lock_session(&self.session, "decoder")?;
        let outputs = session.run(inputs).context("Decoder inference failed")?;

        let logits = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract decoder logits")?
            .into_dimensionality::<Ix3>()
            .context("Unexpected decoder output rank, expected [batch, seq_len, vocab]")?;

        let last = logits.shape()[1]
            .checked_sub(1)
            .ok_or_else(|| anyhow::anyhow!("Decoder returned empty sequence"))?;

        let next_logits = logits.slice(s![0, last, ..]).to_vec();
        Ok(next_logits)
    }
}

/// `bos` plus the prompt ids, with any bos/sep the tokenizer inserted dropped
fn prompt_tokens(
    tokenizer: &Tokenizer,
    config: &BlipGenerationConfig,
    prompt: Option<&str>,
) -> Result<Vec<u32>> {
    let mut tokens = vec![config.bos_token_id];

    if let Some(text) = prompt {
        let encoding = tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Failed to encode prompt: {}", e))?;

        tokens.extend(
            encoding
                .get_ids()
                .iter()
                .copied()
                .filter(|&id| id != config.bos_token_id && id != config.sep_token_id),
        );
    }

    Ok(tokens)
}

/// Greedy loop: append the argmax of `step(tokens)` until `sep` or `budget` steps
///
/// `sep` is never appended.
fn greedy_decode<F>(mut tokens: Vec<u32>, budget: usize, sep: u32, mut step: F) -> Result<Vec<u32>>
where
    F: FnMut(&[u32]) -> Result<Vec<f32>>,
{
    for i in 0..budget {
        let logits = step(&tokens)?;
        let next_token = argmax(&logits)?;

        if next_token == sep {
            debug!("Generation stopped at SEP after {} steps", i);
            break;
        }
        tokens.push(next_token);
    }

    Ok(tokens)
}

fn validate_decoder_inputs(names: &[String]) -> Result<()> {
    if let Some(unsupported) = names.iter().find(|n| !SUPPORTED_INPUTS.contains(&n.as_str())) {
        anyhow::bail!(
            "Decoder graph expects unsupported input '{}'; export the text decoder without KV cache",
            unsupported
        );
    }
    for required in [INPUT_IDS, ENCODER_HIDDEN_STATES] {
        if !names.iter().any(|n| n == required) {
            anyhow::bail!("Decoder graph is missing required input '{}'", required);
        }
    }
    Ok(())
}

/// Greedy pick of the highest logit
fn argmax(logits: &[f32]) -> Result<u32> {
    logits
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(idx, _)| idx as u32)
        .ok_or_else(|| anyhow::anyhow!("Empty logits vector"))
}
