//! Route definitions for the `/sync` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhook;
use crate::state::AppState;

/// Routes mounted at `/sync`.
///
/// ```text
/// POST   /webhook    -> receive_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(webhook::receive_event))
}
