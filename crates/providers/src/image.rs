//! Client for the image-generation ("draw") endpoint used by virtual try-on.
//!
//! The provider is called with a single non-streaming POST. Its answer is
//! either a body of `data:` frames or, occasionally, a plain JSON object;
//! both are handed back as a [`ProviderBody`] for the core interpreter.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use wardrobe_core::tryon::{ProviderBody, ASPECT_RATIO, IMAGE_SIZE};

use crate::env_setting;

pub const API_KEY_VAR: &str = "NANO_BANANA_API_KEY";
pub const BASE_URL_VAR: &str = "NANO_BANANA_API_URL";
pub const MODEL_VAR: &str = "NANO_BANANA_MODEL";
pub const TIMEOUT_VAR: &str = "NANO_BANANA_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "https://api.nanobanana.ai/v1";
pub const DEFAULT_MODEL: &str = "nano-banana-fast";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const DRAW_PATH: &str = "/draw/nano-banana";

/// Connection settings for the image provider.
#[derive(Debug, Clone)]
pub struct ImageGenConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ImageGenConfig {
    /// | Env Var                    | Default                        |
    /// |----------------------------|--------------------------------|
    /// | `NANO_BANANA_API_KEY`      | (none)                         |
    /// | `NANO_BANANA_API_URL`      | `https://api.nanobanana.ai/v1` |
    /// | `NANO_BANANA_MODEL`        | `nano-banana-fast`             |
    /// | `NANO_BANANA_TIMEOUT_SECS` | `120`                          |
    pub fn from_env() -> Self {
        let timeout_secs: u64 = env_setting(TIMEOUT_VAR)
            .map(|v| v.parse().expect("NANO_BANANA_TIMEOUT_SECS must be a valid u64"))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            api_key: env_setting(API_KEY_VAR),
            base_url: env_setting(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            model: env_setting(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.into()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn draw_url(&self) -> String {
        format!("{}{DRAW_PATH}", self.base_url.trim_end_matches('/'))
    }
}

/// Embed raw image bytes as a `data:` URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{mime};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// What the relay asks the provider to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRequest {
    pub prompt: String,
    /// Reference images, as URLs or data URLs.
    pub urls: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDrawRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    aspect_ratio: &'static str,
    image_size: &'static str,
    urls: &'a [String],
    shut_progress: bool,
}

/// Errors from the image provider layer.
#[derive(Debug, thiserror::Error)]
pub enum ImageApiError {
    /// No credential configured; nothing was sent.
    #[error("Image provider is not configured: set {API_KEY_VAR}")]
    MissingApiKey,

    /// Transport failure or timeout; no HTTP status was received.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("Image provider error ({status} {status_text})")]
    ApiError {
        status: u16,
        status_text: String,
        /// Error body, as JSON when it parses and as a string otherwise.
        body: Value,
    },
}

/// An image-generation backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn ensure_configured(&self) -> Result<(), ImageApiError> {
        Ok(())
    }

    async fn draw(&self, request: DrawRequest) -> Result<ProviderBody, ImageApiError>;
}

/// HTTP client for the draw endpoint.
pub struct ImageGenApi {
    client: reqwest::Client,
    config: ImageGenConfig,
}

impl ImageGenApi {
    pub fn new(config: ImageGenConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: ImageGenConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ImageProvider for ImageGenApi {
    fn ensure_configured(&self) -> Result<(), ImageApiError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(ImageApiError::MissingApiKey)
        }
    }

    async fn draw(&self, request: DrawRequest) -> Result<ProviderBody, ImageApiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ImageApiError::MissingApiKey)?;

        let body = WireDrawRequest {
            model: &self.config.model,
            prompt: &request.prompt,
            aspect_ratio: ASPECT_RATIO,
            image_size: IMAGE_SIZE,
            urls: &request.urls,
            shut_progress: false,
        };

        let payload_bytes: usize = request.urls.iter().map(String::len).sum();
        tracing::info!(
            url = %self.config.draw_url(),
            model = %self.config.model,
            prompt_len = request.prompt.len(),
            payload_kb = payload_bytes / 1024,
            "Calling image provider",
        );

        let response = self
            .client
            .post(self.config.draw_url())
            .bearer_auth(api_key)
            .timeout(self.config.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or_default().to_string();
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            tracing::warn!(status = status.as_u16(), %status_text, "Image provider rejected request");
            return Err(ImageApiError::ApiError {
                status: status.as_u16(),
                status_text,
                body,
            });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));
        let text = response.text().await?;
        tracing::debug!(bytes = text.len(), is_json, "Image provider responded");

        Ok(classify_body(text, is_json))
    }
}

/// A JSON-typed body holding an object bypasses frame parsing; anything
/// else is treated as frame text.
fn classify_body(text: String, is_json: bool) -> ProviderBody {
    if is_json {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(&text) {
            return ProviderBody::Structured(value);
        }
    }
    ProviderBody::Text(text)
}
