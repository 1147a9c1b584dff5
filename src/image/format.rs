use image::ImageFormat;

/// Sniff the upload format from its magic bytes.
///
/// Only the formats the upload control accepts are recognized: JPEG and PNG.
pub fn detect_upload_format(bytes: &[u8]) -> Option<ImageFormat> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
        [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageFormat::Png),
        _ => {
            tracing::debug!(
                "Unrecognized upload format (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}
