//! Handlers for the streaming advice relays.

use std::pin::Pin;
use std::task::{ready, Context, Poll};

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt};
use wardrobe_core::advice::{AdviceKind, AdviceRequest};
use wardrobe_core::prompt::{AdvicePrompt, ADVICE_MAX_TOKENS, ADVICE_TEMPERATURE};
use wardrobe_providers::chat::{ChatApiError, ChatCompletionRequest, ChatMessage, TextStream};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// POST /generate-outfit
///
/// Streams outfit suggestions built from the caller's wardrobe.
pub async fn generate_outfit(
    State(state): State<AppState>,
    payload: Result<Json<AdviceRequest>, JsonRejection>,
) -> AppResult<Response> {
    relay_advice(&state, AdviceKind::Outfit, payload).await
}

/// POST /purchase-advice
///
/// Streams a buying plan for the caller's planned items.
pub async fn purchase_advice(
    State(state): State<AppState>,
    payload: Result<Json<AdviceRequest>, JsonRejection>,
) -> AppResult<Response> {
    relay_advice(&state, AdviceKind::Purchase, payload).await
}

/// Validate, compose the prompt and forward the provider's text stream.
///
/// Errors before the first byte become a JSON error response. Once the
/// stream has started, an upstream failure aborts the body instead.
async fn relay_advice(
    state: &AppState,
    kind: AdviceKind,
    payload: Result<Json<AdviceRequest>, JsonRejection>,
) -> AppResult<Response> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    request.validate(kind)?;

    state
        .chat
        .ensure_configured()
        .map_err(|source| AppError::Advice { kind, source })?;

    let prompt = AdvicePrompt::compose(kind, &request);
    tracing::info!(
        kind = kind.as_str(),
        prompt_chars = prompt.user.chars().count(),
        "Relaying advice request",
    );

    let upstream = state
        .chat
        .stream_chat(ChatCompletionRequest {
            messages: vec![ChatMessage::system(prompt.system), ChatMessage::user(prompt.user)],
            temperature: ADVICE_TEMPERATURE,
            max_tokens: ADVICE_MAX_TOKENS,
        })
        .await
        .map_err(|source| AppError::Advice { kind, source })?;

    let body = Body::from_stream(RelayStream::new(kind, upstream));
    Ok(([(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)], body).into_response())
}

/// Provider stream wrapper that logs how the relay ended.
///
/// Dropping it before the upstream finished (the caller went away) drops
/// the upstream stream with it, which closes the provider connection.
struct RelayStream {
    kind: AdviceKind,
    inner: TextStream,
    fragments: usize,
    finished: bool,
}

impl RelayStream {
    fn new(kind: AdviceKind, inner: TextStream) -> Self {
        Self {
            kind,
            inner,
            fragments: 0,
            finished: false,
        }
    }
}

impl Stream for RelayStream {
    type Item = Result<String, ChatApiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let item = ready!(self.inner.poll_next_unpin(cx));
        match &item {
            Some(Ok(_)) => self.fragments += 1,
            Some(Err(e)) => {
                self.finished = true;
                tracing::error!(
                    kind = self.kind.as_str(),
                    fragments = self.fragments,
                    error = %e,
                    "Advice stream interrupted",
                );
            }
            None => {
                self.finished = true;
                tracing::debug!(
                    kind = self.kind.as_str(),
                    fragments = self.fragments,
                    "Advice stream complete",
                );
            }
        }
        Poll::Ready(item)
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                kind = self.kind.as_str(),
                fragments = self.fragments,
                "Caller disconnected, cancelling upstream stream",
            );
        }
    }
}
