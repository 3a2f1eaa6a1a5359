//! Handlers for the `/backfill` resource.
//!
//! A run call is synchronous but budgeted: it returns before the
//! request timeout with `done: false` when the batch was paused, and
//! the caller re-invokes `/run` (or `/resume`) to continue.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::time::Duration;

use leadbridge_core::types::DbId;
use leadbridge_sync::backfill::BackfillOptions;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for starting or continuing a batch.
#[derive(Debug, Default, Deserialize)]
pub struct BackfillRequest {
    /// Restrict to these campaign ids; omitted means every tagged
    /// campaign.
    #[serde(default)]
    pub campaign_ids: Option<Vec<String>>,
    /// Restrict to campaigns in this platform status.
    #[serde(default)]
    pub status_filter: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub max_leads_per_campaign: Option<u32>,
    /// Pending leads loaded per processing round.
    #[serde(default)]
    pub batch_size: Option<i64>,
    /// Override of the configured wall-clock budget, in milliseconds.
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
}

impl BackfillRequest {
    fn into_options(self, state: &AppState) -> BackfillOptions {
        BackfillOptions {
            campaign_ids: self.campaign_ids,
            status_filter: self.status_filter,
            dry_run: self.dry_run,
            max_leads_per_campaign: self.max_leads_per_campaign,
            batch_size: self.batch_size,
            time_budget: self
                .time_limit_ms
                .map(Duration::from_millis)
                .unwrap_or(state.config.backfill_time_budget),
        }
    }
}

/// POST /api/v1/backfill/batches
///
/// Create a new batch and run its first budgeted chunk. `409` when
/// another batch is already active.
pub async fn start_batch(
    State(state): State<AppState>,
    body: Option<Json<BackfillRequest>>,
) -> AppResult<impl axum::response::IntoResponse> {
    let options = body.map(|Json(b)| b).unwrap_or_default().into_options(&state);
    let summary = state.backfill.start(options).await?;

    tracing::info!(
        batch_id = summary.batch_id,
        done = summary.done,
        synced = summary.synced,
        "Backfill batch started"
    );

    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/backfill/batches/{id}/run
///
/// Run one more budgeted chunk of an existing batch.
pub async fn run_batch_chunk(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<BackfillRequest>>,
) -> AppResult<impl axum::response::IntoResponse> {
    let options = body.map(|Json(b)| b).unwrap_or_default().into_options(&state);
    let summary = state.backfill.run_chunk(id, options).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/backfill/batches/{id}/resume
pub async fn resume_batch(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<BackfillRequest>>,
) -> AppResult<impl axum::response::IntoResponse> {
    let options = body.map(|Json(b)| b).unwrap_or_default().into_options(&state);
    let summary = state.backfill.resume(id, options).await?;
    Ok(Json(DataResponse { data: summary }))
}

/// POST /api/v1/backfill/batches/{id}/cancel
pub async fn cancel_batch(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl axum::response::IntoResponse> {
    let batch = state.backfill.cancel(id).await?;
    Ok(Json(DataResponse { data: batch }))
}

/// GET /api/v1/backfill/batches/{id}
///
/// Consolidated batch state: the row plus pending count and completion
/// percentage.
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl axum::response::IntoResponse> {
    let progress = state.backfill.progress(id).await?;
    Ok(Json(DataResponse { data: progress }))
}

/// GET /api/v1/backfill/campaigns
///
/// All campaigns with lead/engagement counts, for operator visibility
/// before starting a batch.
pub async fn list_campaigns(
    State(state): State<AppState>,
) -> AppResult<impl axum::response::IntoResponse> {
    let campaigns = state
        .outreach
        .list_campaigns()
        .await
        .map_err(leadbridge_sync::SyncError::from)?;
    Ok(Json(DataResponse { data: campaigns }))
}
