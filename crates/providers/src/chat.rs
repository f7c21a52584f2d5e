//! Streaming client for an OpenAI-compatible chat-completion API.
//!
//! The provider answers `POST {base}/chat/completions` with
//! `text/event-stream`; each event carries one JSON chunk whose
//! `choices[0].delta.content` is the next text fragment, and a final
//! `[DONE]` event closes the stream.

use std::fmt::Display;

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use crate::env_setting;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_VAR: &str = "OPENAI_API_BASE_URL";
pub const MODEL_VAR: &str = "OPENAI_MODEL_NAME";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Event data that terminates an OpenAI-style stream.
const DONE_MARKER: &str = "[DONE]";

/// Incremental text fragments, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, ChatApiError>>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Connection settings for the chat provider.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl ChatConfig {
    /// | Env Var               | Default                     |
    /// |-----------------------|-----------------------------|
    /// | `OPENAI_API_KEY`      | (none)                      |
    /// | `OPENAI_API_BASE_URL` | `https://api.openai.com/v1` |
    /// | `OPENAI_MODEL_NAME`   | `gpt-3.5-turbo`             |
    pub fn from_env() -> Self {
        Self {
            api_key: env_setting(API_KEY_VAR),
            base_url: env_setting(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            model: env_setting(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.into()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// What the relay asks for; the model comes from [`ChatConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Errors from the chat provider layer.
#[derive(Debug, thiserror::Error)]
pub enum ChatApiError {
    /// No credential configured; nothing was sent.
    #[error("Chat provider is not configured: set {API_KEY_VAR}")]
    MissingApiKey,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider rejected the request before streaming started.
    #[error("Chat provider error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// The stream broke after it had started.
    #[error("Chat stream interrupted: {0}")]
    Stream(String),

    /// A chunk could not be decoded.
    #[error("Malformed stream chunk: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A chat-completion backend with incremental delivery.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Fail fast when the provider cannot be called at all.
    fn ensure_configured(&self) -> Result<(), ChatApiError> {
        Ok(())
    }

    /// Submit `request` and return its text fragments.
    ///
    /// Resolves only once the provider has accepted the request, so a
    /// rejection is reported here rather than inside the stream.
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<TextStream, ChatApiError>;
}

/// HTTP client for an OpenAI-compatible endpoint.
pub struct ChatCompletionApi {
    client: reqwest::Client,
    config: ChatConfig,
}

impl ChatCompletionApi {
    pub fn new(config: ChatConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, config: ChatConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ChatProvider for ChatCompletionApi {
    fn ensure_configured(&self) -> Result<(), ChatApiError> {
        if self.config.is_configured() {
            Ok(())
        } else {
            Err(ChatApiError::MissingApiKey)
        }
    }

    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<TextStream, ChatApiError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ChatApiError::MissingApiKey)?;

        let body = WireRequest {
            model: &self.config.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), "Chat provider rejected request");
            return Err(ChatApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(model = %self.config.model, "Chat stream opened");
        Ok(delta_stream(response.bytes_stream()))
    }
}

// ---------------------------------------------------------------------------
// Stream decoding
// ---------------------------------------------------------------------------

/// Decode an event-stream byte body into text fragments.
///
/// Empty deltas are dropped, `[DONE]` ends the stream, and a transport or
/// decode failure surfaces as an `Err` item so the consumer can tell it
/// apart from a clean end.
pub fn delta_stream<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    bytes
        .eventsource()
        .map_err(|e| ChatApiError::Stream(e.to_string()))
        .try_take_while(|event| futures::future::ready(Ok(event.data.trim() != DONE_MARKER)))
        .try_filter_map(|event| futures::future::ready(parse_delta(&event.data)))
        .boxed()
}

/// Extract the text fragment from one chunk, if it carries any.
fn parse_delta(data: &str) -> Result<Option<String>, ChatApiError> {
    let chunk: StreamChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ChatApiError::Stream(message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use futures::stream;

    fn chunk(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    async fn collect(parts: Vec<Result<String, std::io::Error>>) -> Vec<Result<String, ChatApiError>> {
        let bytes = stream::iter(parts.into_iter().map(|p| p.map(bytes::Bytes::from)));
        delta_stream(bytes).collect().await
    }

    #[tokio::test]
    async fn yields_deltas_in_order_and_stops_at_done() {
        let body = format!(
            "{}{}data: {{\"choices\":[{{\"delta\":{{\"role\":\"assistant\"}}}}]}}\n\n{}data: [DONE]\n\n{}",
            chunk("Hello"),
            chunk(", "),
            chunk("world"),
            chunk("after done"),
        );
        let items = collect(vec![Ok(body)]).await;
        let text: Vec<String> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(text, vec!["Hello", ", ", "world"]);
    }

    #[tokio::test]
    async fn events_split_across_chunks_are_reassembled() {
        let body = format!("{}{}", chunk("你好"), chunk("世界"));
        let (a, b) = body.as_bytes().split_at(7);
        let parts = vec![
            Ok(String::from_utf8_lossy(a).into_owned()),
            Ok(String::from_utf8_lossy(b).into_owned()),
        ];
        let items = collect(parts).await;
        let text: String = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(text, "你好世界");
    }

    #[tokio::test]
    async fn transport_failure_is_an_error_item() {
        let parts = vec![
            Ok(chunk("partial")),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ];
        let items = collect(parts).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "partial");
        assert_matches!(items[1], Err(ChatApiError::Stream(_)));
    }

    #[tokio::test]
    async fn in_band_error_event_is_an_error_item() {
        let body = format!(
            "{}data: {{\"error\":{{\"message\":\"overloaded\"}}}}\n\n",
            chunk("a")
        );
        let items = collect(vec![Ok(body)]).await;
        assert_matches!(&items[1], Err(ChatApiError::Stream(msg)) if msg == "overloaded");
    }

    #[test]
    fn empty_delta_is_skipped() {
        assert_eq!(parse_delta(r#"{"choices":[{"delta":{"content":""}}]}"#).unwrap(), None);
        assert_eq!(parse_delta(r#"{"choices":[]}"#).unwrap(), None);
        assert!(parse_delta("not json").is_err());
    }
}
