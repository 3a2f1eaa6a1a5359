//! Route definitions for the `/watchdog` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::watchdog;
use crate::state::AppState;

/// Routes mounted at `/watchdog`.
///
/// ```text
/// POST   /run    -> run_sweep
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(watchdog::run_sweep))
}
