//! Handler for incoming engagement webhooks.
//!
//! Filtered and unsupported events are acknowledged with `200` and
//! `processed: false` so the platform does not retry-storm; only
//! malformed payloads get `400` and a bad shared secret gets `401`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use leadbridge_core::types::DbId;
use leadbridge_sync::classifier::{Classification, RawWebhookEvent};
use leadbridge_sync::engine::{SyncDisposition, SyncRequest, SyncSource};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

const SECRET_HEADER: &str = "x-webhook-secret";

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    #[serde(default)]
    pub secret: Option<String>,
}

/// Sync result detail exposed to the webhook caller.
#[derive(Debug, Serialize)]
pub struct SyncResultBody {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub crm_org_id: Option<DbId>,
    pub crm_person_id: Option<DbId>,
    pub org_created: bool,
    pub person_created: bool,
    pub post_deletion: bool,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    /// `true` only when the event reached the CRM.
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SyncResultBody>,
}

/// POST /api/v1/sync/webhook
///
/// Receive one engagement event from the outreach platform. The shared
/// secret, when configured, may arrive as a `?secret=` query parameter
/// or an `x-webhook-secret` header.
pub async fn receive_event(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: Result<Json<RawWebhookEvent>, JsonRejection>,
) -> AppResult<Json<WebhookResponse>> {
    verify_secret(&state, &query, &headers)?;

    // Payloads that do not deserialize (missing or wrongly-typed
    // `event_type`/`campaign_id`) are a 400, not axum's default 422.
    let Json(raw) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    tracing::debug!(
        event_type = %raw.event_type,
        campaign_id = %raw.campaign_id,
        "Webhook event received"
    );

    let event = match state.classifier.classify(raw).await {
        Classification::InScope(event) => event,
        Classification::Dropped(reason) => {
            return Ok(Json(WebhookResponse {
                success: true,
                processed: false,
                skipped_reason: Some(reason.as_str()),
                result: None,
            }));
        }
    };

    let report = state
        .engine
        .process(SyncRequest {
            event,
            source: SyncSource::Webhook,
            dry_run: false,
        })
        .await;

    let (processed, outcome, skip_reason, error) = match &report.disposition {
        SyncDisposition::Synced => (true, "success", None, None),
        SyncDisposition::Skipped(reason) => (false, "skipped", Some(reason.as_str()), None),
        SyncDisposition::Failed(message) => (false, "error", None, Some(message.clone())),
    };

    Ok(Json(WebhookResponse {
        success: true,
        processed,
        skipped_reason: skip_reason,
        result: Some(SyncResultBody {
            outcome,
            skip_reason,
            error,
            crm_org_id: report.crm_org_id,
            crm_person_id: report.crm_person_id,
            org_created: report.org_created,
            person_created: report.person_created,
            post_deletion: report.post_deletion,
        }),
    }))
}

/// Check the shared secret when one is configured. An unset secret
/// leaves the endpoint open.
fn verify_secret(
    state: &AppState,
    query: &WebhookQuery,
    headers: &HeaderMap,
) -> Result<(), AppError> {
    let Some(expected) = state.config.webhook_secret.as_deref() else {
        return Ok(());
    };

    let provided = query
        .secret
        .as_deref()
        .or_else(|| headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok()));

    match provided {
        Some(secret) if secret == expected => Ok(()),
        _ => Err(AppError::Unauthorized("Invalid webhook secret".into())),
    }
}
