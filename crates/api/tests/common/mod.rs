#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use futures::stream::{self, StreamExt};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use wardrobe_api::config::ServerConfig;
use wardrobe_api::router::build_app_router;
use wardrobe_api::state::AppState;
use wardrobe_core::tryon::ProviderBody;
use wardrobe_providers::chat::{
    ChatApiError, ChatCompletionRequest, ChatConfig, ChatProvider, TextStream,
};
use wardrobe_providers::image::{DrawRequest, ImageApiError, ImageGenConfig, ImageProvider};

/// Build a test `ServerConfig` with safe defaults.
///
/// Provider configs carry no credentials; tests inject fakes instead.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 1024 * 1024,
        chat: ChatConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/v1".into(),
            model: "test-model".into(),
        },
        image: ImageGenConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/v1".into(),
            model: "test-image-model".into(),
            timeout: Duration::from_secs(5),
        },
    }
}

/// Build the full application router with the production middleware stack
/// and the given providers.
pub fn build_test_app(chat: Arc<dyn ChatProvider>, image: Arc<dyn ImageProvider>) -> Router {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        chat,
        image,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fake chat provider
// ---------------------------------------------------------------------------

/// What the fake chat provider does when called.
#[derive(Clone)]
pub enum ChatScript {
    /// Stream these fragments, then end cleanly.
    Fragments(Vec<&'static str>),
    /// Stream these fragments, then fail.
    FailAfter(Vec<&'static str>),
    /// Stream these fragments, then stay open until dropped.
    Hang(Vec<&'static str>),
    /// Reject before streaming with this upstream status.
    Reject(u16),
    /// No credential configured.
    Unconfigured,
}

pub struct FakeChat {
    script: ChatScript,
    pub last_request: Mutex<Option<ChatCompletionRequest>>,
    pub calls: Mutex<usize>,
    /// Set when a stream handed out by this provider is dropped.
    pub stream_dropped: Arc<AtomicBool>,
}

impl FakeChat {
    pub fn new(script: ChatScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            last_request: Mutex::new(None),
            calls: Mutex::new(0),
            stream_dropped: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

/// Sets a flag when dropped; travels inside the fake stream.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

fn fragments(parts: &[&'static str]) -> Vec<Result<String, ChatApiError>> {
    parts.iter().map(|p| Ok(p.to_string())).collect()
}

#[async_trait]
impl ChatProvider for FakeChat {
    fn ensure_configured(&self) -> Result<(), ChatApiError> {
        match self.script {
            ChatScript::Unconfigured => Err(ChatApiError::MissingApiKey),
            _ => Ok(()),
        }
    }

    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<TextStream, ChatApiError> {
        *self.calls.lock().unwrap() += 1;
        *self.last_request.lock().unwrap() = Some(request);

        let flag = DropFlag(Arc::clone(&self.stream_dropped));
        let head = match &self.script {
            ChatScript::Unconfigured => return Err(ChatApiError::MissingApiKey),
            ChatScript::Reject(status) => {
                return Err(ChatApiError::ApiError {
                    status: *status,
                    body: "rejected".into(),
                })
            }
            ChatScript::Fragments(parts) => stream::iter(fragments(parts)).boxed(),
            ChatScript::FailAfter(parts) => stream::iter(fragments(parts))
                .chain(stream::once(async {
                    Err(ChatApiError::Stream("connection reset".into()))
                }))
                .boxed(),
            ChatScript::Hang(parts) => stream::iter(fragments(parts))
                .chain(stream::pending())
                .boxed(),
        };

        // The flag is owned by the stream, so it drops with it.
        Ok(head
            .map(move |item| {
                let _keep = &flag;
                item
            })
            .boxed())
    }
}

// ---------------------------------------------------------------------------
// Fake image provider
// ---------------------------------------------------------------------------

/// What the fake image provider answers.
#[derive(Clone)]
pub enum ImageScript {
    Body(ProviderBody),
    Http {
        status: u16,
        status_text: &'static str,
        body: Value,
    },
    Unconfigured,
}

pub struct FakeImage {
    script: ImageScript,
    pub last_request: Mutex<Option<DrawRequest>>,
}

impl FakeImage {
    pub fn new(script: ImageScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            last_request: Mutex::new(None),
        })
    }

    pub fn frames(body: &str) -> Arc<Self> {
        Self::new(ImageScript::Body(ProviderBody::Text(body.to_string())))
    }

    pub fn was_called(&self) -> bool {
        self.last_request.lock().unwrap().is_some()
    }
}

#[async_trait]
impl ImageProvider for FakeImage {
    fn ensure_configured(&self) -> Result<(), ImageApiError> {
        match self.script {
            ImageScript::Unconfigured => Err(ImageApiError::MissingApiKey),
            _ => Ok(()),
        }
    }

    async fn draw(&self, request: DrawRequest) -> Result<ProviderBody, ImageApiError> {
        *self.last_request.lock().unwrap() = Some(request);
        match &self.script {
            ImageScript::Body(body) => Ok(body.clone()),
            ImageScript::Http {
                status,
                status_text,
                body,
            } => Err(ImageApiError::ApiError {
                status: *status,
                status_text: status_text.to_string(),
                body: body.clone(),
            }),
            ImageScript::Unconfigured => Err(ImageApiError::MissingApiKey),
        }
    }
}

/// Chat provider for tests that only exercise try-on.
pub fn idle_chat() -> Arc<FakeChat> {
    FakeChat::new(ChatScript::Fragments(vec![]))
}

/// Image provider for tests that only exercise advice.
pub fn idle_image() -> Arc<FakeImage> {
    FakeImage::frames("")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body as UTF-8 text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, json: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&json).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// One part of a hand-built multipart body.
pub struct Part {
    pub name: &'static str,
    pub file_name: Option<&'static str>,
    pub content_type: Option<&'static str>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn text(name: &'static str, value: &str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }

    pub fn file(name: &'static str, content_type: &'static str, data: &[u8]) -> Self {
        Self {
            name,
            file_name: Some("photo.jpg"),
            content_type: Some(content_type),
            data: data.to_vec(),
        }
    }
}

const BOUNDARY: &str = "wardrobe-test-boundary";

pub async fn post_multipart(app: Router, uri: &str, parts: Vec<Part>) -> Response<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
