use wardrobe_providers::chat::ChatConfig;
use wardrobe_providers::image::ImageGenConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// Provider credentials are optional at startup; a relay whose credential
/// is missing reports a configuration error per request.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `180`). Must exceed the
    /// image provider timeout so upstream timeouts are reported by the relay.
    pub request_timeout_secs: u64,
    /// Maximum accepted request body, in bytes (default: 20 MiB).
    pub max_upload_bytes: usize,
    /// Chat-completion provider settings.
    pub chat: ChatConfig,
    /// Image-generation provider settings.
    pub image: ImageGenConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `180`                      |
    /// | `MAX_UPLOAD_BYTES`     | `20971520`                 |
    ///
    /// Provider variables are documented on [`ChatConfig::from_env`] and
    /// [`ImageGenConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "180".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "20971520".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let chat = ChatConfig::from_env();
        let image = ImageGenConfig::from_env();

        if request_timeout_secs <= image.timeout.as_secs() {
            tracing::warn!(
                request_timeout_secs,
                image_timeout_secs = image.timeout.as_secs(),
                "Request timeout does not exceed the image provider timeout",
            );
        }

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            chat,
            image,
        }
    }
}
