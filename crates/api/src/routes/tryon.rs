use axum::routing::post;
use axum::Router;

use crate::handlers::tryon;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/virtual-tryon", post(tryon::virtual_try_on))
}
