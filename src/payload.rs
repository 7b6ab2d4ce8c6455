use base64::{engine::general_purpose, Engine as _};
use image::ImageFormat;

use crate::error::InferenceError;

/// Raw image bytes plus the media type they were declared (or detected) as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    media_type: String,
}

impl ImagePayload {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        media_type: impl Into<String>,
    ) -> Result<Self, InferenceError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(InferenceError::InvalidImage("image is empty".to_string()));
        }
        Ok(Self {
            bytes,
            media_type: media_type.into(),
        })
    }

    /// Builds a payload from an uploaded file.
    ///
    /// A declared `image/*` type is trusted; anything else falls back to
    /// sniffing the magic bytes.
    pub fn from_upload(
        bytes: impl Into<Vec<u8>>,
        declared: Option<&str>,
    ) -> Result<Self, InferenceError> {
        let bytes = bytes.into();
        match declared {
            Some(media_type) if media_type.starts_with("image/") => Self::new(bytes, media_type),
            _ => {
                let media_type = sniff_media_type(&bytes)?;
                Self::new(bytes, media_type)
            }
        }
    }

    /// Accepts `data:<mime>;base64,<data>` or bare base64 text.
    pub fn from_data_url(text: &str) -> Result<Self, InferenceError> {
        let text = text.trim();
        let declared = text
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .and_then(|(header, _)| header.split(';').next())
            .filter(|media_type| !media_type.is_empty());

        let bytes = general_purpose::STANDARD
            .decode(strip_data_url_prefix(text))
            .map_err(|e| InferenceError::InvalidImage(format!("invalid base64: {e}")))?;

        Self::from_upload(bytes, declared)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Standard base64 of the raw bytes, without any data-URL prefix.
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Returns the data portion of a `data:` URL, or the input when it is not one.
pub fn strip_data_url_prefix(text: &str) -> &str {
    if text.starts_with("data:") {
        text.split_once(',').map_or("", |(_, data)| data)
    } else {
        text
    }
}

fn sniff_media_type(bytes: &[u8]) -> Result<&'static str, InferenceError> {
    let format = image::guess_format(bytes)
        .map_err(|_| InferenceError::InvalidImage("unsupported image format".to_string()))?;

    let media_type = match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        _ => {
            return Err(InferenceError::InvalidImage(format!(
                "unsupported image format: {format:?}"
            )))
        }
    };
    Ok(media_type)
}

/// A user question about an image. Never blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    pub fn new(text: impl Into<String>) -> Result<Self, InferenceError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InferenceError::EmptyQuestion);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
