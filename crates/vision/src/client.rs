use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use paverly_core::config::VisionConfig;

use crate::prompt::build_prompt;
use crate::types::{InlineImage, SimulationRequest, VisionError};

const ERROR_BODY_EXCERPT_LEN: usize = 200;
const TEXT_EXCERPT_LEN: usize = 100;

/// The wizard's one asynchronous integration point.
#[async_trait]
pub trait VisionClient: Send + Sync {
    async fn generate(&self, request: &SimulationRequest) -> Result<InlineImage, VisionError>;
}

// ---------------------------------------------------------------------------
// Provider wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(
        default,
        rename = "inlineData",
        alias = "inline_data",
        skip_serializing_if = "Option::is_none"
    )]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(value: String) -> Self {
        Self { text: Some(value), inline_data: None }
    }

    fn image(image: InlineImage) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData { mime_type: image.mime_type, data: image.data }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType", alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// Pull the generated image out of a provider response: the first
/// inline-data part wins; models that answer in prose sometimes embed a
/// data URL in the text instead, so that is scanned as a fallback.
fn extract_generated_image(response: GenerateContentResponse) -> Result<InlineImage, VisionError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    for part in &parts {
        if let Some(inline) = &part.inline_data {
            return Ok(InlineImage::new(inline.mime_type.clone(), inline.data.clone()));
        }
    }

    let text =
        parts.into_iter().filter_map(|part| part.text).collect::<Vec<_>>().join("\n");
    if let Some(image) = extract_data_url(&text) {
        return Ok(image);
    }

    Err(VisionError::NoImage { excerpt: truncate(&text, TEXT_EXCERPT_LEN) })
}

/// Scan free text for an embedded `data:image/...;base64,` URL.
fn extract_data_url(text: &str) -> Option<InlineImage> {
    let start = text.find("data:image/")?;
    let rest = &text[start + "data:".len()..];
    let (mime_type, rest) = rest.split_once(";base64,")?;
    if !mime_type.starts_with("image/") {
        return None;
    }

    let end = rest
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || matches!(ch, '+' | '/' | '=')))
        .unwrap_or(rest.len());
    let data = &rest[..end];
    if data.is_empty() {
        return None;
    }

    Some(InlineImage::new(mime_type.to_string(), data.to_string()))
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Client for the hosted generative-image API. Fetches the reference
/// texture by URL, re-encodes it inline, and sends prompt + both images
/// in one generateContent call.
#[derive(Debug)]
pub struct GenerativeImageClient {
    http: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl GenerativeImageClient {
    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        let api_key = config.api_key.clone().ok_or(VisionError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    async fn fetch_texture(&self, url: &str) -> Result<InlineImage, VisionError> {
        let map_fetch = |source: reqwest::Error| VisionError::TextureFetch {
            url: url.to_string(),
            source,
        };

        let response =
            self.http.get(url).send().await.and_then(|r| r.error_for_status()).map_err(map_fetch)?;
        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response.bytes().await.map_err(map_fetch)?;

        Ok(InlineImage::new(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(&bytes),
        ))
    }

    async fn send(
        &self,
        url: &str,
        body: &GenerateContentRequest,
    ) -> Result<InlineImage, VisionError> {
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Http {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_EXCERPT_LEN),
            });
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|error| VisionError::Decode(error.to_string()))?;
        extract_generated_image(parsed)
    }
}

fn is_retryable(error: &VisionError) -> bool {
    match error {
        VisionError::Transport(source) => !source.is_builder(),
        VisionError::Http { status, .. } => *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl VisionClient for GenerativeImageClient {
    async fn generate(&self, request: &SimulationRequest) -> Result<InlineImage, VisionError> {
        let texture = self.fetch_texture(&request.paver_texture).await?;
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::text(build_prompt(request)),
                    Part::image(request.original_image.clone()),
                    Part::image(texture),
                ],
            }],
        };
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        let mut attempt = 0;
        loop {
            match self.send(&url, &body).await {
                Ok(image) => return Ok(image),
                Err(error) if is_retryable(&error) && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        error = %error,
                        attempt,
                        max_retries = self.max_retries,
                        "visualization call failed, retrying"
                    );
                }
                Err(error) => return Err(error),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

/// Canned collaborator for tests and offline runs.
#[derive(Clone, Debug)]
pub enum StaticVisionClient {
    Success(InlineImage),
    Failure(String),
}

impl StaticVisionClient {
    pub fn succeeding() -> Self {
        Self::Success(InlineImage::new("image/png", "Z2VuZXJhdGVk"))
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }
}

#[async_trait]
impl VisionClient for StaticVisionClient {
    async fn generate(&self, _request: &SimulationRequest) -> Result<InlineImage, VisionError> {
        match self {
            Self::Success(image) => Ok(image.clone()),
            Self::Failure(reason) => Err(VisionError::NoImage { excerpt: reason.clone() }),
        }
    }
}
