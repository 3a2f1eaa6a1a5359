//! Storage seams for the sync subsystem.
//!
//! Three narrow traits cover what the engine, backfill orchestrator,
//! and watchdog need from the database. [`PgStore`] implements all of
//! them by delegating to the `leadbridge-db` repositories; tests use
//! in-memory fakes.

use async_trait::async_trait;
use sqlx::PgPool;

use leadbridge_core::types::DbId;
use leadbridge_db::models::backfill::{BackfillBatch, BackfillLead};
use leadbridge_db::models::contact::Contact;
use leadbridge_db::models::cron::{CronJobLogEntry, WatchdogAlert};
use leadbridge_db::models::sync_log::{outcome, NewSyncLog, SyncLogEntry};
use leadbridge_db::repositories::{
    BackfillRepo, ContactRepo, CronJobLogRepo, SyncLogRepo, WatchdogAlertRepo,
};

use crate::SyncError;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Persistence operations of the sync engine and retry subsystem.
#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Look up the local contact record for a lead email.
    async fn find_contact(&self, email: &str) -> Result<Option<Contact>, SyncError>;

    /// Persist a sync-log row.
    ///
    /// When `dedupe` is set (idempotent event types), an existing row
    /// for the same (campaign, lead, event) tuple is updated in place;
    /// otherwise a new row is appended. An existing `error` row is
    /// always updated rather than duplicated, regardless of `dedupe`.
    async fn record(&self, entry: NewSyncLog, dedupe: bool) -> Result<SyncLogEntry, SyncError>;

    /// All sync-log rows with outcome `error`.
    async fn list_failed(&self) -> Result<Vec<SyncLogEntry>, SyncError>;

    /// Latest row for the (campaign, lead, event) tuple, only when it
    /// is currently in `error`.
    async fn find_failed(
        &self,
        campaign_id: &str,
        lead_email: &str,
        event_type: &str,
    ) -> Result<Option<SyncLogEntry>, SyncError>;
}

/// Persistence operations of the backfill orchestrator.
#[async_trait]
pub trait BackfillStore: Send + Sync {
    async fn create_batch(&self, dry_run: bool) -> Result<BackfillBatch, SyncError>;
    async fn find_batch(&self, id: DbId) -> Result<Option<BackfillBatch>, SyncError>;
    async fn find_active_batch(&self) -> Result<Option<BackfillBatch>, SyncError>;
    async fn set_batch_status(
        &self,
        id: DbId,
        status: &str,
    ) -> Result<Option<BackfillBatch>, SyncError>;
    async fn set_collection_progress(
        &self,
        id: DbId,
        campaign_index: i32,
        campaign_name: &str,
        campaign_count: i32,
    ) -> Result<(), SyncError>;
    async fn set_total_leads(&self, id: DbId, total: i32) -> Result<(), SyncError>;
    async fn increment_counter(&self, id: DbId, lead_status: &str) -> Result<(), SyncError>;
    async fn mark_batch_failed(&self, id: DbId, error: &str) -> Result<(), SyncError>;

    /// Returns `true` when the lead was newly inserted, `false` when a
    /// row for the tuple already existed.
    async fn insert_lead(
        &self,
        batch_id: DbId,
        lead_email: &str,
        campaign_id: &str,
        campaign_name: Option<&str>,
        event_type: &str,
    ) -> Result<bool, SyncError>;
    async fn list_pending_leads(
        &self,
        batch_id: DbId,
        limit: i64,
    ) -> Result<Vec<BackfillLead>, SyncError>;
    async fn count_pending_leads(&self, batch_id: DbId) -> Result<i64, SyncError>;
    async fn count_leads(&self, batch_id: DbId) -> Result<i64, SyncError>;
    async fn mark_lead(
        &self,
        lead_id: DbId,
        status: &str,
        crm_org_id: Option<DbId>,
        crm_person_id: Option<DbId>,
        error_message: Option<&str>,
    ) -> Result<(), SyncError>;
    async fn was_lead_synced(
        &self,
        campaign_id: &str,
        lead_email: &str,
    ) -> Result<bool, SyncError>;

    /// Contact lookup for the skip-existing fast path.
    async fn find_contact(&self, email: &str) -> Result<Option<Contact>, SyncError>;
}

/// Persistence operations of the cron watchdog.
#[async_trait]
pub trait WatchdogStore: Send + Sync {
    async fn latest_job_run(&self, job_name: &str)
        -> Result<Option<CronJobLogEntry>, SyncError>;
    async fn latest_alert(
        &self,
        job_name: &str,
        alert_type: &str,
    ) -> Result<Option<WatchdogAlert>, SyncError>;
    async fn insert_alert(
        &self,
        job_name: &str,
        alert_type: &str,
        message: &str,
    ) -> Result<WatchdogAlert, SyncError>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

/// Postgres-backed implementation of all three store traits.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgStore {
    async fn find_contact(&self, email: &str) -> Result<Option<Contact>, SyncError> {
        Ok(ContactRepo::find_by_email(&self.pool, email).await?)
    }

    async fn record(&self, entry: NewSyncLog, dedupe: bool) -> Result<SyncLogEntry, SyncError> {
        let existing = SyncLogRepo::find_latest(
            &self.pool,
            &entry.campaign_id,
            &entry.lead_email,
            &entry.event_type,
        )
        .await?;

        if let Some(existing) = existing {
            if dedupe || existing.outcome == outcome::ERROR {
                if let Some(updated) =
                    SyncLogRepo::update_result(&self.pool, existing.id, &entry).await?
                {
                    return Ok(updated);
                }
            }
        }

        Ok(SyncLogRepo::insert(&self.pool, &entry).await?)
    }

    async fn list_failed(&self) -> Result<Vec<SyncLogEntry>, SyncError> {
        Ok(SyncLogRepo::list_failed(&self.pool).await?)
    }

    async fn find_failed(
        &self,
        campaign_id: &str,
        lead_email: &str,
        event_type: &str,
    ) -> Result<Option<SyncLogEntry>, SyncError> {
        let latest =
            SyncLogRepo::find_latest(&self.pool, campaign_id, lead_email, event_type).await?;
        Ok(latest.filter(|row| row.outcome == outcome::ERROR))
    }
}

#[async_trait]
impl BackfillStore for PgStore {
    async fn create_batch(&self, dry_run: bool) -> Result<BackfillBatch, SyncError> {
        Ok(BackfillRepo::create_batch(&self.pool, dry_run).await?)
    }

    async fn find_batch(&self, id: DbId) -> Result<Option<BackfillBatch>, SyncError> {
        Ok(BackfillRepo::find_batch(&self.pool, id).await?)
    }

    async fn find_active_batch(&self) -> Result<Option<BackfillBatch>, SyncError> {
        Ok(BackfillRepo::find_active_batch(&self.pool).await?)
    }

    async fn set_batch_status(
        &self,
        id: DbId,
        status: &str,
    ) -> Result<Option<BackfillBatch>, SyncError> {
        Ok(BackfillRepo::set_batch_status(&self.pool, id, status).await?)
    }

    async fn set_collection_progress(
        &self,
        id: DbId,
        campaign_index: i32,
        campaign_name: &str,
        campaign_count: i32,
    ) -> Result<(), SyncError> {
        Ok(BackfillRepo::set_collection_progress(
            &self.pool,
            id,
            campaign_index,
            campaign_name,
            campaign_count,
        )
        .await?)
    }

    async fn set_total_leads(&self, id: DbId, total: i32) -> Result<(), SyncError> {
        Ok(BackfillRepo::set_total_leads(&self.pool, id, total).await?)
    }

    async fn increment_counter(&self, id: DbId, lead_status: &str) -> Result<(), SyncError> {
        Ok(BackfillRepo::increment_counter(&self.pool, id, lead_status).await?)
    }

    async fn mark_batch_failed(&self, id: DbId, error: &str) -> Result<(), SyncError> {
        Ok(BackfillRepo::mark_batch_failed(&self.pool, id, error).await?)
    }

    async fn insert_lead(
        &self,
        batch_id: DbId,
        lead_email: &str,
        campaign_id: &str,
        campaign_name: Option<&str>,
        event_type: &str,
    ) -> Result<bool, SyncError> {
        Ok(BackfillRepo::insert_lead(
            &self.pool,
            batch_id,
            lead_email,
            campaign_id,
            campaign_name,
            event_type,
        )
        .await?)
    }

    async fn list_pending_leads(
        &self,
        batch_id: DbId,
        limit: i64,
    ) -> Result<Vec<BackfillLead>, SyncError> {
        Ok(BackfillRepo::list_pending_leads(&self.pool, batch_id, limit).await?)
    }

    async fn count_pending_leads(&self, batch_id: DbId) -> Result<i64, SyncError> {
        Ok(BackfillRepo::count_pending_leads(&self.pool, batch_id).await?)
    }

    async fn count_leads(&self, batch_id: DbId) -> Result<i64, SyncError> {
        Ok(BackfillRepo::count_leads(&self.pool, batch_id).await?)
    }

    async fn mark_lead(
        &self,
        lead_id: DbId,
        status: &str,
        crm_org_id: Option<DbId>,
        crm_person_id: Option<DbId>,
        error_message: Option<&str>,
    ) -> Result<(), SyncError> {
        Ok(BackfillRepo::mark_lead(
            &self.pool,
            lead_id,
            status,
            crm_org_id,
            crm_person_id,
            error_message,
        )
        .await?)
    }

    async fn was_lead_synced(
        &self,
        campaign_id: &str,
        lead_email: &str,
    ) -> Result<bool, SyncError> {
        Ok(BackfillRepo::was_lead_synced(&self.pool, campaign_id, lead_email).await?)
    }

    async fn find_contact(&self, email: &str) -> Result<Option<Contact>, SyncError> {
        Ok(ContactRepo::find_by_email(&self.pool, email).await?)
    }
}

#[async_trait]
impl WatchdogStore for PgStore {
    async fn latest_job_run(
        &self,
        job_name: &str,
    ) -> Result<Option<CronJobLogEntry>, SyncError> {
        Ok(CronJobLogRepo::find_latest_for_job(&self.pool, job_name).await?)
    }

    async fn latest_alert(
        &self,
        job_name: &str,
        alert_type: &str,
    ) -> Result<Option<WatchdogAlert>, SyncError> {
        Ok(WatchdogAlertRepo::find_latest(&self.pool, job_name, alert_type).await?)
    }

    async fn insert_alert(
        &self,
        job_name: &str,
        alert_type: &str,
        message: &str,
    ) -> Result<WatchdogAlert, SyncError> {
        Ok(WatchdogAlertRepo::insert(&self.pool, job_name, alert_type, message).await?)
    }
}
