//! Sync engine: idempotently projects one classified event onto the CRM.
//!
//! The engine resolves or creates the organization and person by
//! natural key (search before create), applies the event-specific
//! mutation with status monotonicity enforced, and persists a sync-log
//! row. Failures never escape the engine boundary: the caller always
//! receives a structured [`SyncReport`], so one bad lead cannot abort
//! a batch or crash a webhook request.

use std::sync::Arc;

use leadbridge_core::events::{SkipReason, SyncEventType};
use leadbridge_core::pipeline::PipelineStatus;
use leadbridge_core::types::DbId;
use leadbridge_crm::types::Person;
use leadbridge_crm::CrmApi;
use leadbridge_db::models::sync_log::{outcome, NewSyncLog};

use crate::classifier::ClassifiedEvent;
use crate::guard::{self, GuardDecision};
use crate::store::SyncStore;
use crate::SyncError;

/// Where a sync request originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSource {
    Webhook,
    Backfill,
}

impl SyncSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncSource::Webhook => "webhook",
            SyncSource::Backfill => "backfill",
        }
    }
}

/// One unit of work for the engine.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub event: ClassifiedEvent,
    pub source: SyncSource,
    /// Compute would-be effects without mutating the CRM or writing a
    /// sync-log row.
    pub dry_run: bool,
}

/// What happened to the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDisposition {
    Synced,
    Skipped(SkipReason),
    Failed(String),
}

/// Structured result returned for every engine invocation.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub disposition: SyncDisposition,
    pub crm_org_id: Option<DbId>,
    pub crm_person_id: Option<DbId>,
    pub org_created: bool,
    pub person_created: bool,
    pub post_deletion: bool,
    pub dry_run: bool,
}

impl SyncReport {
    fn skipped(reason: SkipReason, dry_run: bool) -> Self {
        Self {
            disposition: SyncDisposition::Skipped(reason),
            crm_org_id: None,
            crm_person_id: None,
            org_created: false,
            person_created: false,
            post_deletion: false,
            dry_run,
        }
    }
}

/// The core sync component.
pub struct SyncEngine {
    crm: Arc<dyn CrmApi>,
    store: Arc<dyn SyncStore>,
}

impl SyncEngine {
    pub fn new(crm: Arc<dyn CrmApi>, store: Arc<dyn SyncStore>) -> Self {
        Self { crm, store }
    }

    /// Process one classified event. Never returns an error: upstream
    /// failures become a `Failed` disposition in the report.
    pub async fn process(&self, request: SyncRequest) -> SyncReport {
        let event = &request.event;

        let contact = match self.store.find_contact(&event.lead_email).await {
            Ok(contact) => contact,
            Err(e) => {
                tracing::error!(error = %e, lead = %event.lead_email, "Contact lookup failed");
                let report = SyncReport {
                    disposition: SyncDisposition::Failed(e.to_string()),
                    crm_org_id: None,
                    crm_person_id: None,
                    org_created: false,
                    person_created: false,
                    post_deletion: false,
                    dry_run: request.dry_run,
                };
                self.persist(&request, &report).await;
                return report;
            }
        };

        let mut report = match guard::decide(contact.as_ref(), event.event) {
            GuardDecision::Drop => {
                tracing::debug!(
                    lead = %event.lead_email,
                    event = event.event.as_str(),
                    "Dropping post-deletion telemetry"
                );
                // Dropped entirely: no CRM call and no new sync-log
                // row. A prior failed attempt for the tuple is flipped
                // to skipped so it leaves the retry queue.
                let mut report = SyncReport::skipped(SkipReason::PostDeletionDrop, request.dry_run);
                report.post_deletion = true;
                if !request.dry_run && self.had_failed_attempt(event).await {
                    self.persist(&request, &report).await;
                }
                return report;
            }
            GuardDecision::NoteOnly => {
                let stored_person_id = contact.as_ref().and_then(|c| c.crm_person_id);
                match self.note_only(&request, stored_person_id).await {
                    Ok(report) => report,
                    Err(e) => SyncReport {
                        disposition: SyncDisposition::Failed(e.to_string()),
                        crm_org_id: None,
                        crm_person_id: stored_person_id,
                        org_created: false,
                        person_created: false,
                        post_deletion: true,
                        dry_run: request.dry_run,
                    },
                }
            }
            GuardDecision::Proceed => match self.full_sync(&request).await {
                Ok(report) => report,
                Err(e) => SyncReport {
                    disposition: SyncDisposition::Failed(e.to_string()),
                    crm_org_id: None,
                    crm_person_id: None,
                    org_created: false,
                    person_created: false,
                    post_deletion: false,
                    dry_run: request.dry_run,
                },
            },
        };

        report.dry_run = request.dry_run;
        self.persist(&request, &report).await;
        report
    }

    /// Lightweight note-only update for a post-deletion reply: no
    /// organization/person re-sync, no status change.
    async fn note_only(
        &self,
        request: &SyncRequest,
        stored_person_id: Option<DbId>,
    ) -> Result<SyncReport, SyncError> {
        let event = &request.event;

        let person_id = match stored_person_id {
            Some(id) => Some(id),
            None => self
                .crm
                .find_person_by_email(&event.lead_email)
                .await?
                .map(|p| p.id),
        };

        let Some(person_id) = person_id else {
            // Nothing in the CRM to attach a note to.
            let mut report = SyncReport::skipped(SkipReason::PostDeletionDrop, request.dry_run);
            report.post_deletion = true;
            return Ok(report);
        };

        if !request.dry_run {
            let note = note_text(event);
            self.crm.add_note(&note, person_id, None).await?;
        }

        Ok(SyncReport {
            disposition: SyncDisposition::Synced,
            crm_org_id: None,
            crm_person_id: Some(person_id),
            org_created: false,
            person_created: false,
            post_deletion: true,
            dry_run: request.dry_run,
        })
    }

    /// Full create-or-update sequence.
    async fn full_sync(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        let event = &request.event;

        // 1. Organization by company name (falling back to the email
        //    domain when the payload carries no company).
        let org_name = org_name_for(event);
        let (org_id, org_created) = self.resolve_org(&org_name, request.dry_run).await?;

        // 2. Person scoped to the organization, by email.
        let (person, person_created) = self.resolve_person(request, org_id).await?;
        let person_id = person.as_ref().map(|p| p.id);

        // 3. Event-specific mutation, status monotonic.
        if let (Some(person), false) = (&person, person_created) {
            if let Some(target) = PipelineStatus::for_event(event.event) {
                let current = person.status.as_deref().and_then(PipelineStatus::parse);
                if let Some(next) = PipelineStatus::advance(current, target) {
                    if !request.dry_run {
                        self.crm.update_person_status(person.id, next).await?;
                    }
                }
            }
        }

        if let (Some(id), false) = (person_id, request.dry_run) {
            self.crm.add_note(&note_text(event), id, org_id).await?;
        }

        Ok(SyncReport {
            disposition: SyncDisposition::Synced,
            crm_org_id: org_id,
            crm_person_id: person_id,
            org_created,
            person_created,
            post_deletion: false,
            dry_run: request.dry_run,
        })
    }

    /// Find-or-create the organization. A create that races a
    /// concurrent webhook is resolved by re-querying before failing.
    async fn resolve_org(
        &self,
        name: &str,
        dry_run: bool,
    ) -> Result<(Option<DbId>, bool), SyncError> {
        if let Some(org) = self.crm.find_org_by_name(name).await? {
            return Ok((Some(org.id), false));
        }
        if dry_run {
            // Would create.
            return Ok((None, true));
        }
        match self.crm.create_org(name).await {
            Ok(org) => Ok((Some(org.id), true)),
            Err(create_err) => match self.crm.find_org_by_name(name).await? {
                Some(org) => Ok((Some(org.id), false)),
                None => Err(create_err.into()),
            },
        }
    }

    /// Find-or-create the person, same race resolution as the org.
    async fn resolve_person(
        &self,
        request: &SyncRequest,
        org_id: Option<DbId>,
    ) -> Result<(Option<Person>, bool), SyncError> {
        let event = &request.event;
        if let Some(person) = self.crm.find_person_by_email(&event.lead_email).await? {
            return Ok((Some(person), false));
        }
        if request.dry_run {
            return Ok((None, true));
        }
        let Some(org_id) = org_id else {
            // Unreachable outside dry-run; resolve_org always yields an id.
            return Ok((None, true));
        };

        let name = person_name_for(event);
        let initial =
            PipelineStatus::for_event(event.event).unwrap_or(PipelineStatus::Contacted);
        match self
            .crm
            .create_person(&name, &event.lead_email, org_id, initial)
            .await
        {
            Ok(person) => Ok((Some(person), true)),
            Err(create_err) => match self.crm.find_person_by_email(&event.lead_email).await? {
                Some(person) => Ok((Some(person), false)),
                None => Err(create_err.into()),
            },
        }
    }

    /// Whether an `error` row already exists for the event's tuple.
    async fn had_failed_attempt(&self, event: &ClassifiedEvent) -> bool {
        match self
            .store
            .find_failed(&event.campaign_id, &event.lead_email, event.event.as_str())
            .await
        {
            Ok(row) => row.is_some(),
            Err(e) => {
                tracing::error!(error = %e, lead = %event.lead_email, "Failed-attempt lookup failed");
                false
            }
        }
    }

    /// Write the sync-log row for a processed event. Best-effort: a
    /// logging failure is traced, not propagated.
    async fn persist(&self, request: &SyncRequest, report: &SyncReport) {
        if request.dry_run {
            return;
        }

        let event = &request.event;
        let (outcome_str, skip_reason, error_message) = match &report.disposition {
            SyncDisposition::Synced => (outcome::SUCCESS, None, None),
            SyncDisposition::Skipped(reason) => {
                (outcome::SKIPPED, Some(reason.as_str().to_string()), None)
            }
            SyncDisposition::Failed(message) => {
                (outcome::ERROR, None, Some(message.clone()))
            }
        };

        let entry = NewSyncLog {
            campaign_id: event.campaign_id.clone(),
            campaign_name: event.campaign_name.clone(),
            lead_email: event.lead_email.clone(),
            event_type: event.event.as_str().to_string(),
            outcome: outcome_str.to_string(),
            skip_reason,
            error_message,
            crm_org_id: report.crm_org_id,
            crm_person_id: report.crm_person_id,
            org_created: report.org_created,
            person_created: report.person_created,
            post_deletion: report.post_deletion,
            reply_sentiment: event.event.sentiment().map(|s| s.as_str().to_string()),
            source: request.source.as_str().to_string(),
        };

        // Engagement counters legitimately append; everything else
        // updates the existing row for the tuple.
        let dedupe = is_idempotent(event.event);

        if let Err(e) = self.store.record(entry, dedupe).await {
            tracing::error!(
                error = %e,
                lead = %event.lead_email,
                event = event.event.as_str(),
                "Failed to persist sync log entry"
            );
        }
    }
}

/// Whether repeated identical events must update history in place.
fn is_idempotent(event: SyncEventType) -> bool {
    event.is_status_changing() || event == SyncEventType::CampaignCompleted
}

fn org_name_for(event: &ClassifiedEvent) -> String {
    if let Some(company) = event.company_name.as_deref().filter(|c| !c.trim().is_empty()) {
        return company.trim().to_string();
    }
    event
        .lead_email
        .split_once('@')
        .map(|(_, domain)| domain.to_string())
        .unwrap_or_else(|| event.lead_email.clone())
}

fn person_name_for(event: &ClassifiedEvent) -> String {
    if let Some(name) = event.lead_name.as_deref().filter(|n| !n.trim().is_empty()) {
        return name.trim().to_string();
    }
    event
        .lead_email
        .split_once('@')
        .map(|(local, _)| local.to_string())
        .unwrap_or_else(|| event.lead_email.clone())
}

fn note_text(event: &ClassifiedEvent) -> String {
    let campaign = event
        .campaign_name
        .as_deref()
        .unwrap_or(&event.campaign_id);
    let what = match event.event {
        SyncEventType::EmailSent => "email sent",
        SyncEventType::EmailOpened => "email opened",
        SyncEventType::EmailClicked => "email link clicked",
        SyncEventType::EmailBounced => "email bounced",
        SyncEventType::LeadUnsubscribed => "lead unsubscribed",
        SyncEventType::LeadInterested => "lead replied (interested)",
        SyncEventType::LeadNotInterested => "lead replied (not interested)",
        SyncEventType::LeadNeutral => "lead replied (neutral)",
        SyncEventType::MeetingBooked => "meeting booked",
        SyncEventType::MeetingCompleted => "meeting completed",
        SyncEventType::LeadClosed => "lead closed",
        SyncEventType::CampaignCompleted => "campaign sequence completed",
    };
    format!("Outreach: {what} [campaign: {campaign}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::testing::{classified, FakeCrm, MemorySyncStore};

    fn engine(crm: Arc<FakeCrm>, store: Arc<MemorySyncStore>) -> SyncEngine {
        SyncEngine::new(crm, store)
    }

    fn request(event: SyncEventType, email: &str) -> SyncRequest {
        SyncRequest {
            event: classified(event, email),
            source: SyncSource::Webhook,
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn replaying_an_event_is_idempotent() {
        let crm = Arc::new(FakeCrm::new());
        let store = Arc::new(MemorySyncStore::new());
        let engine = engine(Arc::clone(&crm), Arc::clone(&store));

        let first = engine
            .process(request(SyncEventType::LeadInterested, "jane@acme.io"))
            .await;
        let second = engine
            .process(request(SyncEventType::LeadInterested, "jane@acme.io"))
            .await;

        assert_matches!(first.disposition, SyncDisposition::Synced);
        assert_matches!(second.disposition, SyncDisposition::Synced);
        assert_eq!(first.crm_org_id, second.crm_org_id);
        assert_eq!(first.crm_person_id, second.crm_person_id);
        assert!(first.org_created);
        assert!(!second.org_created);
        assert_eq!(crm.org_count(), 1);
        assert_eq!(crm.person_count(), 1);
        // Idempotent event type: one log row, two attempts.
        let logs = store.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].attempt_count, 2);
    }

    #[tokio::test]
    async fn status_never_regresses_across_a_sequence() {
        let crm = Arc::new(FakeCrm::new());
        let store = Arc::new(MemorySyncStore::new());
        let engine = engine(Arc::clone(&crm), store);

        for event in [
            SyncEventType::EmailSent,
            SyncEventType::EmailOpened,
            SyncEventType::MeetingBooked,
            SyncEventType::EmailOpened,
        ] {
            engine.process(request(event, "jane@acme.io")).await;
        }

        assert_eq!(
            crm.person_status("jane@acme.io"),
            Some("meeting_booked".to_string())
        );
    }

    #[tokio::test]
    async fn engagement_events_append_log_history() {
        let crm = Arc::new(FakeCrm::new());
        let store = Arc::new(MemorySyncStore::new());
        let engine = engine(crm, Arc::clone(&store));

        engine
            .process(request(SyncEventType::EmailOpened, "jane@acme.io"))
            .await;
        engine
            .process(request(SyncEventType::EmailOpened, "jane@acme.io"))
            .await;

        assert_eq!(store.entries().len(), 2);
    }

    #[tokio::test]
    async fn crm_failure_becomes_error_outcome() {
        let crm = Arc::new(FakeCrm::new());
        crm.fail_next_create();
        let store = Arc::new(MemorySyncStore::new());
        let engine = engine(crm, Arc::clone(&store));

        let report = engine
            .process(request(SyncEventType::LeadInterested, "jane@acme.io"))
            .await;

        assert_matches!(report.disposition, SyncDisposition::Failed(_));
        let logs = store.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, "error");
    }

    #[tokio::test]
    async fn failed_then_retried_updates_in_place() {
        let crm = Arc::new(FakeCrm::new());
        crm.fail_next_create();
        let store = Arc::new(MemorySyncStore::new());
        let engine = engine(Arc::clone(&crm), Arc::clone(&store));

        engine
            .process(request(SyncEventType::LeadInterested, "jane@acme.io"))
            .await;
        engine
            .process(request(SyncEventType::LeadInterested, "jane@acme.io"))
            .await;

        let logs = store.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, "success");
        assert_eq!(logs[0].attempt_count, 2);
    }

    #[tokio::test]
    async fn post_deletion_bounce_is_dropped_without_any_trace() {
        let crm = Arc::new(FakeCrm::new());
        let store = Arc::new(MemorySyncStore::new());
        store.insert_removed_contact("gone@acme.io", Some(7), Some(9));
        let engine = engine(Arc::clone(&crm), Arc::clone(&store));

        let report = engine
            .process(request(SyncEventType::EmailBounced, "gone@acme.io"))
            .await;

        assert_matches!(
            report.disposition,
            SyncDisposition::Skipped(SkipReason::PostDeletionDrop)
        );
        assert!(report.post_deletion);
        assert_eq!(crm.call_count(), 0);
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn drop_after_failed_attempt_flips_the_row_to_skipped() {
        let crm = Arc::new(FakeCrm::new());
        crm.fail_next_create();
        let store = Arc::new(MemorySyncStore::new());
        let engine = engine(Arc::clone(&crm), Arc::clone(&store));

        engine
            .process(request(SyncEventType::EmailBounced, "gone@acme.io"))
            .await;
        assert_eq!(store.entries()[0].outcome, "error");

        // The lead is removed from the platform before the retry.
        store.insert_removed_contact("gone@acme.io", Some(7), Some(9));
        let report = engine
            .process(request(SyncEventType::EmailBounced, "gone@acme.io"))
            .await;

        assert_matches!(
            report.disposition,
            SyncDisposition::Skipped(SkipReason::PostDeletionDrop)
        );
        let logs = store.entries();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].outcome, "skipped");
        assert_eq!(logs[0].attempt_count, 2);
        assert!(logs[0].post_deletion);
    }

    #[tokio::test]
    async fn post_deletion_reply_leaves_a_note_only_trace() {
        let crm = Arc::new(FakeCrm::new());
        let store = Arc::new(MemorySyncStore::new());
        store.insert_removed_contact("gone@acme.io", Some(7), Some(9));
        let engine = engine(Arc::clone(&crm), Arc::clone(&store));

        let report = engine
            .process(request(SyncEventType::LeadInterested, "gone@acme.io"))
            .await;

        assert_matches!(report.disposition, SyncDisposition::Synced);
        assert!(report.post_deletion);
        assert_eq!(report.crm_person_id, Some(9));
        // Note only: no org/person creation, no status change.
        assert_eq!(crm.org_count(), 0);
        assert_eq!(crm.person_count(), 0);
        assert_eq!(crm.note_count(), 1);
        let logs = store.entries();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].post_deletion);
    }

    #[tokio::test]
    async fn dry_run_mutates_nothing() {
        let crm = Arc::new(FakeCrm::new());
        let store = Arc::new(MemorySyncStore::new());
        let engine = engine(Arc::clone(&crm), Arc::clone(&store));

        let report = engine
            .process(SyncRequest {
                event: classified(SyncEventType::LeadInterested, "jane@acme.io"),
                source: SyncSource::Backfill,
                dry_run: true,
            })
            .await;

        assert_matches!(report.disposition, SyncDisposition::Synced);
        assert!(report.org_created);
        assert!(report.person_created);
        assert_eq!(crm.org_count(), 0);
        assert_eq!(crm.person_count(), 0);
        assert_eq!(crm.note_count(), 0);
        assert!(store.entries().is_empty());
    }
}
