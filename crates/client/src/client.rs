//! HTTP client for the assistant relays.

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use wardrobe_core::advice::{AdviceKind, AdviceRequest};
use wardrobe_core::tryon::TryOnResult;

use crate::decoder::IncrementalDecoder;

/// Message shown when a success response carries no image.
const NO_IMAGE_IN_RESULT: &str = "生成失败，未获得图像数据";

/// Errors from [`AssistantClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server refused the request before any advice was streamed.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The advice stream broke after it had started. `partial` holds the
    /// text received so far; it is not a complete answer.
    #[error("Advice stream interrupted: {cause}")]
    Interrupted { partial: String, cause: String },

    /// The try-on relay reported a failure.
    #[error(transparent)]
    TryOn(#[from] TryOnFailure),

    /// The server answered with something other than the documented shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// How a try-on failure should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryOnFailureKind {
    /// The server has no image provider credential.
    Configuration,
    /// The provider likely refused the content; the message is a suggestion.
    ContentViolation,
    /// The upload was incomplete.
    Validation,
    /// The provider failed or answered unusably.
    Upstream,
}

/// A failed try-on, classified from the relay's error body.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct TryOnFailure {
    pub kind: TryOnFailureKind,
    pub status: u16,
    /// User-facing text.
    pub message: String,
    /// Diagnostic details from the relay, if any.
    pub details: Option<Value>,
}

impl TryOnFailure {
    /// Classify an error response body.
    pub fn from_response(status: u16, body: &Value) -> Self {
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("未知错误");
        let generic = format!("API 错误：{error}");

        let (kind, message) = if body.get("possibleContentViolation") == Some(&Value::Bool(true)) {
            let suggestion = body
                .get("suggestion")
                .and_then(Value::as_str)
                .map(str::to_string);
            (TryOnFailureKind::ContentViolation, suggestion.unwrap_or(generic))
        } else if body.get("code").and_then(Value::as_str) == Some("CONFIGURATION_ERROR") {
            (TryOnFailureKind::Configuration, generic)
        } else if status == 400 {
            (TryOnFailureKind::Validation, generic)
        } else {
            (TryOnFailureKind::Upstream, generic)
        };

        Self {
            kind,
            status,
            message,
            details: body.get("details").cloned(),
        }
    }
}

/// Client for a running assistant server.
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Request advice and follow the streamed answer.
    ///
    /// `on_update` receives the full text received so far after every chunk
    /// that completed at least one character. Returns the complete text on a
    /// clean end of stream; a broken stream yields
    /// [`ClientError::Interrupted`] carrying the partial text.
    pub async fn stream_advice<F>(
        &self,
        kind: AdviceKind,
        request: &AdviceRequest,
        mut on_update: F,
    ) -> Result<String, ClientError>
    where
        F: FnMut(&str),
    {
        let response = self
            .http
            .post(self.url(advice_path(kind)))
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                message: error_message(&body, status),
            });
        }

        let mut decoder = IncrementalDecoder::new();
        let mut text = String::new();
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    let piece = decoder.push(&bytes);
                    if !piece.is_empty() {
                        text.push_str(&piece);
                        on_update(&text);
                    }
                }
                Err(e) => {
                    text.push_str(&decoder.finish());
                    tracing::warn!(kind = kind.as_str(), received = text.len(), error = %e, "Advice stream interrupted");
                    return Err(ClientError::Interrupted {
                        partial: text,
                        cause: e.to_string(),
                    });
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            text.push_str(&tail);
            on_update(&text);
        }
        Ok(text)
    }

    /// Upload a photo and an outfit description for a try-on image.
    pub async fn virtual_try_on(
        &self,
        image: Vec<u8>,
        file_name: &str,
        outfit: &str,
    ) -> Result<TryOnResult, ClientError> {
        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(image_mime(file_name))?;
        let form = Form::new().part("image", part).text("outfit", outfit.to_string());

        let response = self
            .http
            .post(self.url("/virtual-tryon"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|e| ClientError::UnexpectedResponse(format!("{e}: {text}")))?;

        if !status.is_success() {
            let failure = TryOnFailure::from_response(status.as_u16(), &body);
            if let Some(details) = &failure.details {
                tracing::debug!(status = status.as_u16(), %details, "Try-on failure details");
            }
            return Err(failure.into());
        }

        let result: TryOnResult = serde_json::from_value(body)
            .map_err(|e| ClientError::UnexpectedResponse(e.to_string()))?;
        if result.image_url.trim().is_empty() {
            return Err(ClientError::UnexpectedResponse(NO_IMAGE_IN_RESULT.into()));
        }
        Ok(result)
    }
}

/// Route of the advice relay for `kind`.
pub fn advice_path(kind: AdviceKind) -> &'static str {
    match kind {
        AdviceKind::Outfit => "/generate-outfit",
        AdviceKind::Purchase => "/purchase-advice",
    }
}

/// MIME type for an uploaded photo, from its extension.
fn image_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/png",
    }
}

/// The `error` field of a JSON error body, or the status reason.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string())
}
