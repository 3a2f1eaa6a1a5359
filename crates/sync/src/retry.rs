//! Retry subsystem.
//!
//! Resubmits failed sync-log rows through the sync engine. A retry
//! that succeeds flips the row to `success`; one that fails again
//! keeps `error` and bumps the attempt count. There is no automatic
//! attempt cutoff: retries are operator-triggered (manually or via a
//! scheduled job), so exhaustion is an operational concern.

use std::sync::Arc;

use serde::Serialize;

use leadbridge_core::events::SyncEventType;
use leadbridge_db::models::sync_log::{source, SyncLogEntry};

use crate::classifier::ClassifiedEvent;
use crate::engine::{SyncDisposition, SyncEngine, SyncRequest, SyncSource};
use crate::store::SyncStore;
use crate::SyncError;

/// Aggregate result of one retry sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetryOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub still_failing: usize,
    pub skipped: usize,
}

/// Re-runs failed syncs through the engine.
pub struct RetrySubsystem {
    engine: Arc<SyncEngine>,
    store: Arc<dyn SyncStore>,
}

impl RetrySubsystem {
    pub fn new(engine: Arc<SyncEngine>, store: Arc<dyn SyncStore>) -> Self {
        Self { engine, store }
    }

    /// All sync-log rows currently in `error`, oldest first.
    pub async fn list_failed(&self) -> Result<Vec<SyncLogEntry>, SyncError> {
        self.store.list_failed().await
    }

    /// Resubmit every failed row through the engine. Each row is
    /// updated in place by the engine's own recording path.
    pub async fn retry_all(&self) -> Result<RetryOutcome, SyncError> {
        let failed = self.store.list_failed().await?;
        let mut outcome = RetryOutcome {
            attempted: failed.len(),
            ..Default::default()
        };
        tracing::info!(count = failed.len(), "Retrying failed syncs");

        for row in failed {
            let Ok(event) = SyncEventType::from_wire(&row.event_type) else {
                // A row whose event type is no longer in the taxonomy
                // cannot be replayed; leave it for the operator.
                tracing::warn!(
                    id = row.id,
                    event_type = %row.event_type,
                    "Skipping failed row with unreplayable event type"
                );
                outcome.skipped += 1;
                continue;
            };

            let request = SyncRequest {
                event: ClassifiedEvent {
                    event,
                    campaign_id: row.campaign_id.clone(),
                    campaign_name: row.campaign_name.clone(),
                    lead_email: row.lead_email.clone(),
                    lead_name: None,
                    company_name: None,
                },
                source: if row.source == source::BACKFILL {
                    SyncSource::Backfill
                } else {
                    SyncSource::Webhook
                },
                dry_run: false,
            };

            let report = self.engine.process(request).await;
            match report.disposition {
                SyncDisposition::Synced | SyncDisposition::Skipped(_) => outcome.succeeded += 1,
                SyncDisposition::Failed(ref message) => {
                    tracing::warn!(id = row.id, error = %message, "Retry failed again");
                    outcome.still_failing += 1;
                }
            }
        }

        tracing::info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            still_failing = outcome.still_failing,
            "Retry sweep finished"
        );
        Ok(outcome)
    }
}
