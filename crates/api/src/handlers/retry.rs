//! Handlers for the `/retry` resource.

use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/retry/failures
///
/// All sync-log rows currently in `error`, oldest first.
pub async fn list_failures(
    State(state): State<AppState>,
) -> AppResult<impl axum::response::IntoResponse> {
    let failures = state.retry.list_failed().await?;
    Ok(Json(DataResponse { data: failures }))
}

/// POST /api/v1/retry
///
/// Resubmit every failed sync through the engine.
pub async fn retry_all(
    State(state): State<AppState>,
) -> AppResult<impl axum::response::IntoResponse> {
    let outcome = state.retry.retry_all().await?;

    tracing::info!(
        attempted = outcome.attempted,
        succeeded = outcome.succeeded,
        still_failing = outcome.still_failing,
        "Retry sweep triggered via API"
    );

    Ok(Json(DataResponse { data: outcome }))
}
