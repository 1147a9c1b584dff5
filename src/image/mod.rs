//! Upload decoding
//!
//! Turns the raw bytes of an uploaded food photograph into a decoded bitmap.
//! Undecodable input fails here, before it ever reaches the captioning engine.

pub mod format;

pub use format::detect_upload_format;

use crate::{Error, Result};
use image::DynamicImage;
use std::path::Path;

/// Decode an uploaded JPEG or PNG.
pub fn decode_upload(bytes: &[u8]) -> Result<DynamicImage> {
    let format = detect_upload_format(bytes).ok_or_else(|| {
        Error::UnsupportedImage("expected a JPEG or PNG photograph".to_string())
    })?;

    let image = image::load_from_memory_with_format(bytes, format)?;
    tracing::debug!(
        "Decoded {:?} upload ({}x{}, {:?})",
        format,
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// Read and decode an upload from disk.
pub async fn load_upload(path: &Path) -> Result<DynamicImage> {
    let bytes = tokio::fs::read(path).await?;
    decode_upload(&bytes)
}
