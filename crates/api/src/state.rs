use std::sync::Arc;

use wardrobe_providers::chat::ChatProvider;
use wardrobe_providers::image::ImageProvider;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Chat-completion backend used by the advice relays.
    pub chat: Arc<dyn ChatProvider>,
    /// Image-generation backend used by the try-on relay.
    pub image: Arc<dyn ImageProvider>,
}
