pub mod advice;
pub mod health;
pub mod tryon;

use axum::Router;

use crate::state::AppState;

/// Build the relay route tree.
///
/// Route hierarchy:
///
/// ```text
/// /generate-outfit                                 streamed outfit advice (POST)
/// /purchase-advice                                 streamed purchase advice (POST)
/// /virtual-tryon                                   try-on image generation (POST, multipart)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(advice::router())
        .merge(tryon::router())
}
