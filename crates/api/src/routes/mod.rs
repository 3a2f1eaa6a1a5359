pub mod backfill;
pub mod health;
pub mod retry;
pub mod sync;
pub mod watchdog;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sync/webhook                      POST incoming engagement event
///
/// /backfill/batches                  POST start a new batch
/// /backfill/batches/{id}             GET  consolidated batch state
/// /backfill/batches/{id}/run         POST run one budgeted chunk
/// /backfill/batches/{id}/resume      POST paused -> processing + run
/// /backfill/batches/{id}/cancel      POST cancel the batch
/// /backfill/campaigns                GET  campaigns with counts
///
/// /retry/failures                    GET  current failed syncs
/// /retry                             POST retry all failed syncs
///
/// /watchdog/run                      POST one watchdog sweep
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sync", sync::router())
        .nest("/backfill", backfill::router())
        .nest("/retry", retry::router())
        .nest("/watchdog", watchdog::router())
}
