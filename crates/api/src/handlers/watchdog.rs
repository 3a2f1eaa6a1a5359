//! Handlers for the `/watchdog` resource.

use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/watchdog/run
///
/// Run one watchdog sweep on demand. Overdue/recovered alerts are
/// emitted as a side effect, with the same dedup rules as the
/// scheduled sweeps.
pub async fn run_sweep(
    State(state): State<AppState>,
) -> AppResult<impl axum::response::IntoResponse> {
    let report = state.watchdog.run().await?;
    Ok(Json(DataResponse { data: report }))
}
