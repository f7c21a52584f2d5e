#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use wardrobe_api::config::ServerConfig;
use wardrobe_api::router::build_app_router;
use wardrobe_api::state::AppState;
use wardrobe_client::AssistantClient;
use wardrobe_core::tryon::ProviderBody;
use wardrobe_providers::chat::{
    ChatApiError, ChatCompletionRequest, ChatConfig, ChatProvider, TextStream,
};
use wardrobe_providers::image::{DrawRequest, ImageApiError, ImageGenConfig, ImageProvider};

/// Chat provider replaying fixed fragments, optionally failing at the end.
pub struct ScriptedChat {
    pub fragments: Vec<&'static str>,
    pub fail_at_end: bool,
}

#[async_trait]
impl ChatProvider for ScriptedChat {
    async fn stream_chat(&self, _request: ChatCompletionRequest) -> Result<TextStream, ChatApiError> {
        let items: Vec<Result<String, ChatApiError>> =
            self.fragments.iter().map(|f| Ok(f.to_string())).collect();
        let head = stream::iter(items);
        if self.fail_at_end {
            // Give the server a chance to flush the fragments before failing.
            let tail = stream::once(async {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Err(ChatApiError::Stream("upstream reset".into()))
            });
            Ok(head.chain(tail).boxed())
        } else {
            Ok(head.boxed())
        }
    }
}

/// Image provider answering with a fixed result.
pub enum ScriptedImage {
    Body(ProviderBody),
    Unconfigured,
}

#[async_trait]
impl ImageProvider for ScriptedImage {
    fn ensure_configured(&self) -> Result<(), ImageApiError> {
        match self {
            ScriptedImage::Unconfigured => Err(ImageApiError::MissingApiKey),
            ScriptedImage::Body(_) => Ok(()),
        }
    }

    async fn draw(&self, _request: DrawRequest) -> Result<ProviderBody, ImageApiError> {
        match self {
            ScriptedImage::Body(body) => Ok(body.clone()),
            ScriptedImage::Unconfigured => Err(ImageApiError::MissingApiKey),
        }
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".into()],
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

/// Serve the real router with the given providers and return a client for it.
pub async fn spawn_server(
    chat: Arc<dyn ChatProvider>,
    image: Arc<dyn ImageProvider>,
) -> AssistantClient {
    let config = test_config();
    let state = AppState {
        config: Arc::new(config.clone()),
        chat,
        image,
    };
    let app = build_app_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    AssistantClient::new(format!("http://{addr}"))
}
