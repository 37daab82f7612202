// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! BLIP pipeline tests against exported model files
//!
//! Requires an ONNX export of `Salesforce/blip-image-captioning-base`
//! (vision_model.onnx, text_decoder_model.onnx, tokenizer.json) under
//! `./blip_model`. Run with `cargo test -- --ignored`.

use caption_server::vision::blip::{BlipLoadOptions, BlipModel};
use caption_server::vision::{CaptionModel, CONDITIONAL_PROMPT};
use image::{DynamicImage, Rgb, RgbImage};

const MODEL_DIR: &str = "./blip_model";

fn red_square() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([255, 0, 0])))
}

async fn load() -> BlipModel {
    BlipModel::new(MODEL_DIR, BlipLoadOptions::default())
        .await
        .expect("BLIP model files should be present for ignored tests")
}

#[tokio::test]
#[ignore]
async fn test_red_square_caption_pair() {
    let model = load().await;
    let pair = model.caption_pair(&red_square()).unwrap();

    for caption in [&pair.conditional, &pair.unconditional] {
        assert!(!caption.is_empty());
        assert!(caption.len() < 200, "caption too long: {}", caption);
        assert!(caption.chars().all(|c| c.is_ascii() && !c.is_ascii_control()));
    }
    assert!(pair.conditional.starts_with(CONDITIONAL_PROMPT));
}

#[tokio::test]
#[ignore]
async fn test_greedy_decoding_is_deterministic() {
    let model = load().await;
    let image = red_square();

    let first = model.caption_pair(&image).unwrap();
    let second = model.caption_pair(&image).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
#[ignore]
async fn test_shared_encoding_matches_separate_runs() {
    let model = load().await;
    let image = red_square();

    let pair = model.caption_pair(&image).unwrap();
    assert_eq!(pair.conditional, model.caption(&image, Some(CONDITIONAL_PROMPT)).unwrap());
    assert_eq!(pair.unconditional, model.caption(&image, None).unwrap());
}

#[tokio::test]
#[ignore]
async fn test_max_new_tokens_caps_caption() {
    let model = BlipModel::new(
        MODEL_DIR,
        BlipLoadOptions {
            max_new_tokens: Some(2),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let caption = model.caption(&red_square(), None).unwrap();
    assert!(caption.split_whitespace().count() <= 2, "caption: {}", caption);
}
