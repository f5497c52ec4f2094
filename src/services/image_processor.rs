// src/services/image_processor.rs
use crate::errors::MockitError;
use base64::{Engine as _, engine::general_purpose};
use image::ImageFormat as ImgFormat;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub const INVALID_TYPE_MESSAGE: &str = "Please upload a valid image file (PNG, JPG, etc.).";
pub const TOO_LARGE_MESSAGE: &str = "File is too large. Please upload an image under 5MB.";

pub struct ImageProcessor {
    max_upload_bytes: usize,
}

/// Split `data:{mime};base64,{payload}` into its MIME type and payload.
/// Returns `None` when there is no payload after the comma.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let (header, payload) = uri.split_once(',')?;
    if payload.is_empty() {
        return None;
    }
    let mime = header
        .strip_prefix("data:")
        .and_then(|h| h.split(';').next())
        .filter(|m| !m.is_empty())
        .unwrap_or("image/png");
    Some((mime, payload))
}

impl ImageProcessor {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self { max_upload_bytes }
    }

    /// Checks the declared MIME type and the size of an uploaded file.
    pub fn validate_upload(&self, content_type: &str, size: usize) -> Result<(), MockitError> {
        if !content_type.starts_with("image/") {
            return Err(MockitError::Validation(INVALID_TYPE_MESSAGE.to_string()));
        }
        if size > self.max_upload_bytes {
            return Err(MockitError::Validation(TOO_LARGE_MESSAGE.to_string()));
        }
        Ok(())
    }

    pub fn to_data_uri(&self, content_type: &str, data: &[u8]) -> String {
        format!(
            "data:{};base64,{}",
            content_type,
            general_purpose::STANDARD.encode(data)
        )
    }

    pub fn decode_data_uri(&self, uri: &str) -> Result<Vec<u8>, MockitError> {
        let (_, payload) = split_data_uri(uri).ok_or_else(|| {
            MockitError::ImageProcessing("Data URI has no image payload".to_string())
        })?;
        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| MockitError::ImageProcessing(format!("Failed to decode image: {}", e)))
    }

    /// Returns PNG bytes, re-encoding only when the input is another format.
    pub fn to_png(&self, data: &[u8]) -> Result<Vec<u8>, MockitError> {
        if matches!(image::guess_format(data), Ok(ImgFormat::Png)) {
            return Ok(data.to_vec());
        }

        let img = image::load_from_memory(data)
            .map_err(|e| MockitError::ImageProcessing(format!("Failed to load image: {}", e)))?;

        let mut output = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Png)
            .map_err(|e| {
                MockitError::ImageProcessing(format!("Failed to encode PNG image: {}", e))
            })?;

        Ok(output)
    }
}
