//! Route definitions for the `/backfill` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::backfill;
use crate::state::AppState;

/// Routes mounted at `/backfill`.
///
/// ```text
/// POST   /batches               -> start_batch
/// GET    /batches/{id}          -> get_batch
/// POST   /batches/{id}/run      -> run_batch_chunk
/// POST   /batches/{id}/resume   -> resume_batch
/// POST   /batches/{id}/cancel   -> cancel_batch
/// GET    /campaigns             -> list_campaigns
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/batches", post(backfill::start_batch))
        .route("/batches/{id}", get(backfill::get_batch))
        .route("/batches/{id}/run", post(backfill::run_batch_chunk))
        .route("/batches/{id}/resume", post(backfill::resume_batch))
        .route("/batches/{id}/cancel", post(backfill::cancel_batch))
        .route("/campaigns", get(backfill::list_campaigns))
}
