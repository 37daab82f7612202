// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Upload decoding and preprocessing tests

use caption_server::vision::blip::{BlipPreprocessorConfig, BlipProcessor};
use caption_server::vision::{decode_image_bytes, ImageError};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use std::io::Cursor;

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

#[test]
fn test_grayscale_png_becomes_rgb() {
    let bytes = encode(
        DynamicImage::ImageLuma8(GrayImage::from_pixel(10, 6, Luma([200]))),
        ImageFormat::Png,
    );

    let (image, info) = decode_image_bytes(&bytes).unwrap();
    assert_eq!((info.width, info.height), (10, 6));
    assert_eq!(image.as_rgb8().unwrap().get_pixel(3, 3), &Rgb([200, 200, 200]));
}

#[test]
fn test_bmp_and_tiff_supported() {
    let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(5, 5, Rgb([0, 128, 255])));

    for format in [ImageFormat::Bmp, ImageFormat::Tiff] {
        let bytes = encode(source.clone(), format);
        let (_, info) = decode_image_bytes(&bytes).unwrap();
        assert_eq!(info.format, format);
    }
}

#[test]
fn test_text_file_rejected() {
    let err = decode_image_bytes(b"hello, this is plain text").unwrap_err();
    assert!(matches!(err, ImageError::UnsupportedFormat));
}

#[test]
fn test_decoded_upload_preprocesses_to_encoder_shape() {
    let bytes = encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 32, Rgb([255, 0, 0]))),
        ImageFormat::Png,
    );
    let (image, _) = decode_image_bytes(&bytes).unwrap();

    let tensor = BlipProcessor::default().preprocess(&image);
    assert_eq!(tensor.shape(), &[1, 3, 384, 384]);

    // Red channel is above the mean, blue below
    assert!(tensor[[0, 0, 0, 0]] > 0.0);
    assert!(tensor[[0, 2, 0, 0]] < 0.0);
}

#[test]
fn test_preprocessor_config_from_exported_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("preprocessor_config.json"),
        r#"{
            "do_normalize": true,
            "do_resize": true,
            "image_mean": [0.48145466, 0.4578275, 0.40821073],
            "image_processor_type": "BlipImageProcessor",
            "image_std": [0.26862954, 0.26130258, 0.27577711],
            "processor_class": "BlipProcessor",
            "resample": 3,
            "rescale_factor": 0.00392156862745098,
            "size": {"height": 384, "width": 384}
        }"#,
    )
    .unwrap();

    let config = BlipPreprocessorConfig::load(dir.path()).unwrap();
    assert_eq!(config, BlipPreprocessorConfig::default());
}
