use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wardrobe_api::config::ServerConfig;
use wardrobe_api::router::build_app_router;
use wardrobe_api::state::AppState;
use wardrobe_providers::chat::ChatCompletionApi;
use wardrobe_providers::image::ImageGenApi;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wardrobe_api=debug,wardrobe_providers=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        chat_model = %config.chat.model,
        chat_configured = config.chat.is_configured(),
        image_model = %config.image.model,
        image_configured = config.image.is_configured(),
        "Loaded server configuration",
    );
    if !config.chat.is_configured() {
        tracing::warn!("OPENAI_API_KEY is not set; advice requests will fail");
    }
    if !config.image.is_configured() {
        tracing::warn!("NANO_BANANA_API_KEY is not set; try-on requests will fail");
    }

    // --- Providers (one shared connection pool) ---
    let http = reqwest::Client::new();
    let chat = Arc::new(ChatCompletionApi::with_client(http.clone(), config.chat.clone()));
    let image = Arc::new(ImageGenApi::with_client(http, config.image.clone()));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        chat,
        image,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
