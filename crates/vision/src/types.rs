use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base64 image payload with its declared mime type, the wire shape both
/// sides of the visualization contract exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self { mime_type: mime_type.into(), data: data.into() }
    }

    /// Parse a `data:image/...;base64,...` URL. Raw base64 without the
    /// data-URL envelope is accepted and assumed to be JPEG, matching the
    /// tolerant behavior of the original upload path.
    pub fn from_data_url(value: &str) -> Result<Self, VisionError> {
        let Some(rest) = value.strip_prefix("data:") else {
            return Ok(Self::new("image/jpeg", value.to_string()));
        };

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| VisionError::InvalidImage("data URL has no payload".to_string()))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| VisionError::InvalidImage("data URL is not base64".to_string()))?;
        if !mime_type.starts_with("image/") {
            return Err(VisionError::InvalidImage(format!(
                "unsupported mime type `{mime_type}`"
            )));
        }

        Ok(Self::new(mime_type.to_string(), data.to_string()))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One visualization request: the customer's photo, the chosen style
/// label, the variant's reference texture, and an optional per-product
/// prompt override.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub original_image: InlineImage,
    pub paver_style: String,
    pub paver_texture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_prompt: Option<String>,
}

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision api key is not configured")]
    MissingApiKey,
    #[error("invalid image payload: {0}")]
    InvalidImage(String),
    #[error("could not fetch reference texture `{url}`: {source}")]
    TextureFetch { url: String, source: reqwest::Error },
    #[error("visualization request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("visualization provider returned status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("provider returned no image; text excerpt: {excerpt}")]
    NoImage { excerpt: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
}
