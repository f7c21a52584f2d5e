use axum::routing::post;
use axum::Router;

use crate::handlers::advice;
use crate::state::AppState;

/// Routes for the advice relays.
///
/// ```text
/// POST /generate-outfit    generate_outfit
/// POST /purchase-advice    purchase_advice
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-outfit", post(advice::generate_outfit))
        .route("/purchase-advice", post(advice::purchase_advice))
}
