//! Backfill orchestrator.
//!
//! Bulk re-sync of historical leads: collect leads from tagged
//! campaigns into durable `backfill_leads` rows, then feed the pending
//! rows sequentially through the sync engine. Processing respects a
//! wall-clock budget measured from the start of the run; when the
//! budget is exceeded the batch is left in `paused` with its remaining
//! leads still `pending`, and the next invocation continues exactly
//! where this one stopped.
//!
//! Leads are processed sequentially within a batch on purpose. A full
//! sync issues several CRM calls per lead and the CRM enforces its own
//! rate limits; parallelizing one batch would trade throttling for
//! little gain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use leadbridge_core::events::{SkipReason, SyncEventType};
use leadbridge_core::types::DbId;
use leadbridge_db::models::backfill::{batch_status, lead_status, BackfillBatch, BackfillLead};
use leadbridge_outreach::types::{Campaign, Lead};
use leadbridge_outreach::OutreachApi;

use crate::classifier::ClassifiedEvent;
use crate::engine::{SyncDisposition, SyncEngine, SyncRequest, SyncSource};
use crate::store::BackfillStore;
use crate::SyncError;

/// Default wall-clock budget for one run invocation.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(240_000);

/// Leads fetched per page during collection.
const COLLECT_PAGE_SIZE: u32 = 100;

/// Default pending leads loaded per processing round.
const PROCESS_CHUNK_SIZE: i64 = 25;

/// Errors from batch lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum BackfillError {
    #[error("Another backfill batch is already active (id {0})")]
    BatchActive(DbId),

    #[error("Backfill batch {0} not found")]
    BatchNotFound(DbId),

    #[error("Backfill batch {batch} cannot {action} from status '{status}'")]
    InvalidTransition {
        batch: DbId,
        status: String,
        action: &'static str,
    },

    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl From<leadbridge_outreach::OutreachError> for BackfillError {
    fn from(err: leadbridge_outreach::OutreachError) -> Self {
        BackfillError::Sync(SyncError::Outreach(err))
    }
}

/// Options for one run invocation.
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// Restrict collection to these campaign ids; `None` means every
    /// tagged campaign.
    pub campaign_ids: Option<Vec<String>>,
    /// Restrict collection to campaigns in this platform status
    /// (`active`, `paused`, `completed`).
    pub status_filter: Option<String>,
    pub dry_run: bool,
    /// Cap on leads collected per campaign.
    pub max_leads_per_campaign: Option<u32>,
    /// Pending leads loaded per processing round.
    pub batch_size: Option<i64>,
    pub time_budget: Duration,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            campaign_ids: None,
            status_filter: None,
            dry_run: false,
            max_leads_per_campaign: None,
            batch_size: None,
            time_budget: DEFAULT_TIME_BUDGET,
        }
    }
}

/// Result of one run invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub batch_id: DbId,
    pub status: String,
    /// `false` means the caller must re-invoke to continue.
    pub done: bool,
    pub stopped_early: bool,
    pub total_leads: i32,
    pub synced: i32,
    pub skipped: i32,
    pub failed: i32,
    pub pending: i64,
    pub duration_ms: u64,
}

/// Consolidated batch state for operator queries: the batch row plus
/// the derived pending count and completion percentage, in one shape.
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    #[serde(flatten)]
    pub batch: BackfillBatch,
    pub pending_leads: i64,
    pub percent_complete: f64,
}

/// Drives backfill batches through collect and process phases.
pub struct BackfillOrchestrator {
    outreach: Arc<dyn OutreachApi>,
    engine: Arc<SyncEngine>,
    store: Arc<dyn BackfillStore>,
    tag: String,
}

impl BackfillOrchestrator {
    pub fn new(
        outreach: Arc<dyn OutreachApi>,
        engine: Arc<SyncEngine>,
        store: Arc<dyn BackfillStore>,
        tag: String,
    ) -> Self {
        Self {
            outreach,
            engine,
            store,
            tag,
        }
    }

    /// Create a new batch and run its first chunk. At most one batch
    /// may be active at a time.
    pub async fn start(&self, options: BackfillOptions) -> Result<RunSummary, BackfillError> {
        if let Some(active) = self.store.find_active_batch().await? {
            return Err(BackfillError::BatchActive(active.id));
        }
        let batch = self.store.create_batch(options.dry_run).await?;
        tracing::info!(batch_id = batch.id, dry_run = options.dry_run, "Backfill batch created");
        self.run_chunk(batch.id, options).await
    }

    /// Run one budgeted chunk of an existing batch, collecting first if
    /// the lead list has not been built yet.
    pub async fn run_chunk(
        &self,
        batch_id: DbId,
        options: BackfillOptions,
    ) -> Result<RunSummary, BackfillError> {
        let started = Instant::now();
        let deadline = started + options.time_budget;

        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or(BackfillError::BatchNotFound(batch_id))?;

        if !matches!(
            batch.status.as_str(),
            batch_status::PENDING
                | batch_status::COLLECTING
                | batch_status::PROCESSING
                | batch_status::PAUSED
        ) {
            return Err(BackfillError::InvalidTransition {
                batch: batch_id,
                status: batch.status,
                action: "run",
            });
        }

        if let Err(err) = self.drive(&batch, &options, deadline).await {
            // The batch must not stay stuck mid-run: record the error
            // and move it to `failed` before propagating.
            tracing::error!(batch_id, error = %err, "Backfill run failed");
            if let Err(mark_err) = self
                .store
                .mark_batch_failed(batch_id, &err.to_string())
                .await
            {
                tracing::error!(batch_id, error = %mark_err, "Failed to record batch failure");
            }
            return Err(err);
        }

        self.summarize(batch_id, started).await
    }

    /// Collect when the lead list has not been built yet, then process.
    async fn drive(
        &self,
        batch: &BackfillBatch,
        options: &BackfillOptions,
        deadline: Instant,
    ) -> Result<(), BackfillError> {
        match batch.status.as_str() {
            batch_status::PENDING | batch_status::COLLECTING => {
                self.collect(batch, options).await?;
            }
            _ => {
                if batch.status == batch_status::PAUSED {
                    self.store
                        .set_batch_status(batch.id, batch_status::PROCESSING)
                        .await?;
                }
            }
        }
        self.process(batch.id, options, deadline).await
    }

    /// Move a paused batch back to processing and continue it.
    pub async fn resume(
        &self,
        batch_id: DbId,
        options: BackfillOptions,
    ) -> Result<RunSummary, BackfillError> {
        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or(BackfillError::BatchNotFound(batch_id))?;
        if batch.status != batch_status::PAUSED {
            return Err(BackfillError::InvalidTransition {
                batch: batch_id,
                status: batch.status,
                action: "resume",
            });
        }
        self.run_chunk(batch_id, options).await
    }

    /// Cancel an active batch. The currently in-flight lead, if any,
    /// is allowed to finish; the loop observes the new status before
    /// picking up the next one.
    pub async fn cancel(&self, batch_id: DbId) -> Result<BackfillBatch, BackfillError> {
        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or(BackfillError::BatchNotFound(batch_id))?;
        match batch.status.as_str() {
            batch_status::PENDING
            | batch_status::COLLECTING
            | batch_status::PROCESSING
            | batch_status::PAUSED => {
                let cancelled = self
                    .store
                    .set_batch_status(batch_id, batch_status::CANCELLED)
                    .await?
                    .ok_or(BackfillError::BatchNotFound(batch_id))?;
                tracing::info!(batch_id, "Backfill batch cancelled");
                Ok(cancelled)
            }
            other => Err(BackfillError::InvalidTransition {
                batch: batch_id,
                status: other.to_string(),
                action: "cancel",
            }),
        }
    }

    /// Consolidated state query for one batch.
    pub async fn progress(&self, batch_id: DbId) -> Result<BatchProgress, BackfillError> {
        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or(BackfillError::BatchNotFound(batch_id))?;
        let pending = self.store.count_pending_leads(batch_id).await?;
        let finished = (batch.synced_count + batch.skipped_count + batch.failed_count) as f64;
        let percent = if batch.total_leads > 0 {
            (finished / batch.total_leads as f64) * 100.0
        } else {
            0.0
        };
        Ok(BatchProgress {
            batch,
            pending_leads: pending,
            percent_complete: percent,
        })
    }

    // -----------------------------------------------------------------------
    // Collection phase
    // -----------------------------------------------------------------------

    /// Build the durable lead list for the batch. Re-running after a
    /// crash is safe: lead insertion dedupes on the (batch, campaign,
    /// email) tuple, and leads synced by a prior batch are skipped at
    /// insert time.
    async fn collect(
        &self,
        batch: &BackfillBatch,
        options: &BackfillOptions,
    ) -> Result<(), BackfillError> {
        self.store
            .set_batch_status(batch.id, batch_status::COLLECTING)
            .await?;

        let mut campaigns = self.outreach.list_tagged_campaigns(&self.tag).await?;
        if let Some(ids) = &options.campaign_ids {
            campaigns.retain(|c| ids.iter().any(|id| id == &c.id));
        }
        if let Some(status) = &options.status_filter {
            campaigns.retain(|c| &c.status == status);
        }
        let campaign_count = campaigns.len() as i32;
        tracing::info!(batch_id = batch.id, campaign_count, "Collecting backfill leads");

        for (index, campaign) in campaigns.iter().enumerate() {
            self.store
                .set_collection_progress(batch.id, index as i32, &campaign.name, campaign_count)
                .await?;
            self.collect_campaign(batch.id, campaign, options).await?;
        }

        let total = self.store.count_leads(batch.id).await?;
        self.store.set_total_leads(batch.id, total as i32).await?;
        self.store
            .set_batch_status(batch.id, batch_status::PROCESSING)
            .await?;
        tracing::info!(batch_id = batch.id, total_leads = total, "Collection finished");
        Ok(())
    }

    async fn collect_campaign(
        &self,
        batch_id: DbId,
        campaign: &Campaign,
        options: &BackfillOptions,
    ) -> Result<(), BackfillError> {
        let mut cursor: Option<String> = None;
        let mut collected: u32 = 0;

        loop {
            let page = self
                .outreach
                .fetch_leads(&campaign.id, cursor.as_deref(), COLLECT_PAGE_SIZE)
                .await?;

            for lead in &page.leads {
                if lead.email.trim().is_empty() {
                    continue;
                }
                if let Some(max) = options.max_leads_per_campaign {
                    if collected >= max {
                        return Ok(());
                    }
                }
                // Leads synced by a prior batch stay out of the list;
                // this is what makes resumption cheap.
                if self.store.was_lead_synced(&campaign.id, &lead.email).await? {
                    continue;
                }
                let event = determine_event(campaign, lead);
                let inserted = self
                    .store
                    .insert_lead(
                        batch_id,
                        &lead.email,
                        &campaign.id,
                        Some(&campaign.name),
                        event.as_str(),
                    )
                    .await?;
                if inserted {
                    collected += 1;
                }
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(()),
            }
        }
    }

    // -----------------------------------------------------------------------
    // Processing phase
    // -----------------------------------------------------------------------

    /// Feed pending leads through the sync engine until the list is
    /// exhausted, the batch is cancelled, or the budget runs out.
    async fn process(
        &self,
        batch_id: DbId,
        options: &BackfillOptions,
        deadline: Instant,
    ) -> Result<(), BackfillError> {
        let chunk_size = options.batch_size.unwrap_or(PROCESS_CHUNK_SIZE);
        loop {
            let leads = self
                .store
                .list_pending_leads(batch_id, chunk_size)
                .await?;
            if leads.is_empty() {
                self.store
                    .set_batch_status(batch_id, batch_status::COMPLETED)
                    .await?;
                tracing::info!(batch_id, "Backfill batch completed");
                return Ok(());
            }

            for lead in leads {
                // Cancellation is observed between leads; an in-flight
                // sync is allowed to finish.
                let current = self
                    .store
                    .find_batch(batch_id)
                    .await?
                    .ok_or(BackfillError::BatchNotFound(batch_id))?;
                if current.status == batch_status::CANCELLED {
                    tracing::info!(batch_id, "Backfill batch cancelled mid-run");
                    return Ok(());
                }

                if Instant::now() >= deadline {
                    self.store
                        .set_batch_status(batch_id, batch_status::PAUSED)
                        .await?;
                    tracing::info!(batch_id, "Time budget exhausted, pausing batch");
                    return Ok(());
                }

                self.process_lead(batch_id, &lead, options).await?;
            }
        }
    }

    async fn process_lead(
        &self,
        batch_id: DbId,
        lead: &BackfillLead,
        options: &BackfillOptions,
    ) -> Result<(), BackfillError> {
        // Fast path: a contact already bearing both CRM ids needs no
        // engine call at all.
        if let Some(contact) = self.store.find_contact(&lead.lead_email).await? {
            if contact.crm_org_id.is_some() && contact.crm_person_id.is_some() {
                self.store
                    .mark_lead(
                        lead.id,
                        lead_status::SKIPPED,
                        contact.crm_org_id,
                        contact.crm_person_id,
                        Some(SkipReason::AlreadySynced.as_str()),
                    )
                    .await?;
                self.store
                    .increment_counter(batch_id, lead_status::SKIPPED)
                    .await?;
                return Ok(());
            }
        }

        let event = match SyncEventType::from_wire(&lead.event_type) {
            Ok(event) => event,
            Err(reason) => {
                self.store
                    .mark_lead(lead.id, lead_status::SKIPPED, None, None, Some(reason.as_str()))
                    .await?;
                self.store
                    .increment_counter(batch_id, lead_status::SKIPPED)
                    .await?;
                return Ok(());
            }
        };

        let report = self
            .engine
            .process(SyncRequest {
                event: ClassifiedEvent {
                    event,
                    campaign_id: lead.campaign_id.clone(),
                    campaign_name: lead.campaign_name.clone(),
                    lead_email: lead.lead_email.clone(),
                    lead_name: None,
                    company_name: None,
                },
                source: SyncSource::Backfill,
                dry_run: options.dry_run,
            })
            .await;

        let (status, error) = match &report.disposition {
            SyncDisposition::Synced => (lead_status::SYNCED, None),
            SyncDisposition::Skipped(reason) => {
                (lead_status::SKIPPED, Some(reason.as_str().to_string()))
            }
            SyncDisposition::Failed(message) => (lead_status::FAILED, Some(message.clone())),
        };
        self.store
            .mark_lead(
                lead.id,
                status,
                report.crm_org_id,
                report.crm_person_id,
                error.as_deref(),
            )
            .await?;
        self.store.increment_counter(batch_id, status).await?;
        Ok(())
    }

    async fn summarize(
        &self,
        batch_id: DbId,
        started: Instant,
    ) -> Result<RunSummary, BackfillError> {
        let batch = self
            .store
            .find_batch(batch_id)
            .await?
            .ok_or(BackfillError::BatchNotFound(batch_id))?;
        let pending = self.store.count_pending_leads(batch_id).await?;
        Ok(RunSummary {
            batch_id,
            done: batch.status == batch_status::COMPLETED,
            stopped_early: batch.status == batch_status::PAUSED,
            status: batch.status,
            total_leads: batch.total_leads,
            synced: batch.synced_count,
            skipped: batch.skipped_count,
            failed: batch.failed_count,
            pending,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Determine the sync event a collected lead should replay: positive
/// reply history wins, then finished campaigns, then plain contact.
fn determine_event(campaign: &Campaign, lead: &Lead) -> SyncEventType {
    match lead.reply_sentiment.as_deref() {
        Some("positive") => return SyncEventType::LeadInterested,
        Some("negative") => return SyncEventType::LeadNotInterested,
        Some("neutral") => return SyncEventType::LeadNeutral,
        _ => {}
    }
    if campaign.status == "completed" || lead.status.as_deref() == Some("completed") {
        SyncEventType::CampaignCompleted
    } else {
        SyncEventType::EmailSent
    }
}
