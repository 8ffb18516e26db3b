// ABOUTME: Image preprocessing for the detection pipeline
// ABOUTME: Decodes uploads into a 224x224 CHW classifier tensor and a PNG payload for remote vision
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Image Preprocessor
//!
//! One decode feeds both detectors:
//!
//! - [`ImageTensor`]: 224x224 RGB, channel-first, values in `[0, 1]`, for the
//!   on-device classifier.
//! - [`EncodedPayload`]: lossless PNG of the original at full resolution,
//!   base64-encoded for the remote vision model. A deployment may set a
//!   longest-side limit, in which case larger photos are downscaled first.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::constants::detection::TENSOR_SIZE;
use crate::errors::AnalysisError;
use crate::llm::ImageAttachment;

/// MIME type of every payload we emit
pub const PAYLOAD_MIME_TYPE: &str = "image/png";

/// Fixed-size classifier input
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Vec<f32>,
    size: u32,
}

impl ImageTensor {
    /// Number of colour channels
    pub const CHANNELS: usize = 3;

    /// Build a tensor from raw CHW data
    ///
    /// # Errors
    ///
    /// Returns a decode error when `data` does not hold exactly `3 * size * size` values.
    pub fn from_chw(data: Vec<f32>, size: u32) -> Result<Self, AnalysisError> {
        let side = size as usize;
        let expected = Self::CHANNELS * side * side;
        if data.len() != expected {
            return Err(AnalysisError::decode(format!(
                "tensor has {} values, expected {expected}",
                data.len()
            )));
        }
        Ok(Self { data, size })
    }

    /// Channel-first values, `[C][H][W]` flattened
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Side length in pixels
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Shape as `[channels, height, width]`
    #[must_use]
    pub const fn shape(&self) -> [usize; 3] {
        [Self::CHANNELS, self.size as usize, self.size as usize]
    }
}

/// Image bytes prepared for transmission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// Standard base64 of `bytes`
    pub base64: String,
    /// MIME type of `bytes`
    pub mime_type: &'static str,
    /// Encoded width in pixels
    pub width: u32,
    /// Encoded height in pixels
    pub height: u32,
}

impl EncodedPayload {
    /// Inline attachment for an LLM request
    #[must_use]
    pub fn to_attachment(&self) -> ImageAttachment {
        ImageAttachment::new(self.mime_type, self.base64.clone())
    }
}

/// Both detector inputs derived from one upload
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// Classifier input
    pub tensor: ImageTensor,
    /// Remote vision input
    pub payload: EncodedPayload,
}

/// Decode and prepare an uploaded image, keeping the payload at full size
///
/// # Errors
///
/// Returns [`AnalysisError::Decode`] for empty input or bytes no supported
/// decoder accepts.
pub fn preprocess(raw_bytes: &[u8]) -> Result<PreprocessedImage, AnalysisError> {
    preprocess_with_limit(raw_bytes, None)
}

/// [`preprocess`] with an optional longest-side limit for the payload
///
/// # Errors
///
/// Returns [`AnalysisError::Decode`] when the bytes are not a readable image.
pub fn preprocess_with_limit(
    raw_bytes: &[u8],
    max_payload_dimension: Option<u32>,
) -> Result<PreprocessedImage, AnalysisError> {
    if raw_bytes.is_empty() {
        return Err(AnalysisError::decode("image is empty"));
    }

    let image = image::load_from_memory(raw_bytes)
        .map_err(|e| AnalysisError::decode(format!("unsupported or corrupt image: {e}")))?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalysisError::decode("image has zero dimensions"));
    }

    let tensor = to_tensor(&image, TENSOR_SIZE)?;
    let payload = encode_payload(&image, max_payload_dimension)?;

    Ok(PreprocessedImage { tensor, payload })
}

fn to_tensor(image: &DynamicImage, size: u32) -> Result<ImageTensor, AnalysisError> {
    let resized = image.resize_exact(size, size, FilterType::Triangle).to_rgb8();
    let side = size as usize;
    let plane = side * side;
    let mut data = vec![0.0_f32; ImageTensor::CHANNELS * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = y as usize * side + x as usize;
        for (channel, value) in pixel.0.iter().enumerate() {
            data[channel * plane + offset] = f32::from(*value) / 255.0;
        }
    }

    ImageTensor::from_chw(data, size)
}

fn encode_payload(
    image: &DynamicImage,
    max_dimension: Option<u32>,
) -> Result<EncodedPayload, AnalysisError> {
    let (width, height) = image.dimensions();
    let scaled;
    let source = match max_dimension.map(|limit| limit.max(1)) {
        Some(limit) if width.max(height) > limit => {
            // resize() fits within the box and keeps the aspect ratio
            scaled = image.resize(limit, limit, FilterType::CatmullRom);
            &scaled
        }
        _ => image,
    };

    let mut bytes = Vec::new();
    source
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| AnalysisError::decode(format!("failed to re-encode image: {e}")))?;

    let (width, height) = source.dimensions();
    Ok(EncodedPayload {
        base64: STANDARD.encode(&bytes),
        bytes,
        mime_type: PAYLOAD_MIME_TYPE,
        width,
        height,
    })
}
