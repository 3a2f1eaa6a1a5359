//! Route definitions for the `/retry` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::retry;
use crate::state::AppState;

/// Routes mounted at `/retry`.
///
/// ```text
/// GET    /failures    -> list_failures
/// POST   /            -> retry_all
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(retry::retry_all))
        .route("/failures", get(retry::list_failures))
}
