//! In-memory fakes shared by the sync crate's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use leadbridge_core::events::SyncEventType;
use leadbridge_core::pipeline::PipelineStatus;
use leadbridge_core::types::DbId;
use leadbridge_crm::types::{Organization, Person};
use leadbridge_crm::{CrmApi, CrmError};
use leadbridge_db::models::backfill::{batch_status, lead_status, BackfillBatch, BackfillLead};
use leadbridge_db::models::contact::Contact;
use leadbridge_db::models::cron::{CronJobLogEntry, WatchdogAlert};
use leadbridge_db::models::sync_log::{outcome, NewSyncLog, SyncLogEntry};
use leadbridge_outreach::types::{Campaign, Lead, LeadPage};
use leadbridge_outreach::{OutreachApi, OutreachError};

use crate::classifier::ClassifiedEvent;
use crate::store::{BackfillStore, SyncStore, WatchdogStore};
use crate::SyncError;

/// Build a classified event for a lead at `email` with full payload
/// fields present.
pub fn classified(event: SyncEventType, email: &str) -> ClassifiedEvent {
    ClassifiedEvent {
        event,
        campaign_id: "camp-1".into(),
        campaign_name: Some("Q3 Outbound".into()),
        lead_email: email.into(),
        lead_name: Some("Jane Doe".into()),
        company_name: Some("Acme".into()),
    }
}

// ---------------------------------------------------------------------------
// FakeCrm
// ---------------------------------------------------------------------------

/// In-memory CRM keyed by natural keys, with call counting and
/// injectable create failures.
#[derive(Default)]
pub struct FakeCrm {
    orgs: Mutex<HashMap<String, Organization>>,
    persons: Mutex<HashMap<String, Person>>,
    notes: Mutex<Vec<(DbId, String)>>,
    next_id: AtomicI64,
    calls: AtomicUsize,
    fail_create: AtomicBool,
}

impl FakeCrm {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Make the next create call fail with a 500.
    pub fn fail_next_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn org_count(&self) -> usize {
        self.orgs.lock().unwrap().len()
    }

    pub fn person_count(&self) -> usize {
        self.persons.lock().unwrap().len()
    }

    pub fn note_count(&self) -> usize {
        self.notes.lock().unwrap().len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn person_status(&self, email: &str) -> Option<String> {
        self.persons
            .lock()
            .unwrap()
            .get(&email.to_lowercase())
            .and_then(|p| p.status.clone())
    }

    fn bump(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn next(&self) -> DbId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn take_failure(&self) -> Result<(), CrmError> {
        if self.fail_create.swap(false, Ordering::SeqCst) {
            Err(CrmError::ApiError {
                status: 500,
                body: "injected failure".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CrmApi for FakeCrm {
    async fn find_org_by_name(&self, name: &str) -> Result<Option<Organization>, CrmError> {
        self.bump();
        Ok(self.orgs.lock().unwrap().get(name).cloned())
    }

    async fn create_org(&self, name: &str) -> Result<Organization, CrmError> {
        self.bump();
        self.take_failure()?;
        let org = Organization {
            id: self.next(),
            name: name.to_string(),
        };
        self.orgs.lock().unwrap().insert(name.to_string(), org.clone());
        Ok(org)
    }

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, CrmError> {
        self.bump();
        Ok(self.persons.lock().unwrap().get(&email.to_lowercase()).cloned())
    }

    async fn create_person(
        &self,
        name: &str,
        email: &str,
        org_id: DbId,
        status: PipelineStatus,
    ) -> Result<Person, CrmError> {
        self.bump();
        self.take_failure()?;
        let person = Person {
            id: self.next(),
            name: name.to_string(),
            email: email.to_string(),
            org_id: Some(org_id),
            status: Some(status.as_str().to_string()),
        };
        self.persons
            .lock()
            .unwrap()
            .insert(email.to_lowercase(), person.clone());
        Ok(person)
    }

    async fn update_person_status(
        &self,
        person_id: DbId,
        status: PipelineStatus,
    ) -> Result<(), CrmError> {
        self.bump();
        let mut persons = self.persons.lock().unwrap();
        if let Some(person) = persons.values_mut().find(|p| p.id == person_id) {
            person.status = Some(status.as_str().to_string());
        }
        Ok(())
    }

    async fn add_note(
        &self,
        content: &str,
        person_id: DbId,
        _org_id: Option<DbId>,
    ) -> Result<(), CrmError> {
        self.bump();
        self.notes.lock().unwrap().push((person_id, content.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySyncStore
// ---------------------------------------------------------------------------

/// In-memory [`SyncStore`] with the same dedupe semantics as the
/// Postgres implementation.
#[derive(Default)]
pub struct MemorySyncStore {
    contacts: Mutex<HashMap<String, Contact>>,
    logs: Mutex<Vec<SyncLogEntry>>,
    next_id: AtomicI64,
}

impl MemorySyncStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn entries(&self) -> Vec<SyncLogEntry> {
        self.logs.lock().unwrap().clone()
    }

    pub fn insert_removed_contact(
        &self,
        email: &str,
        crm_org_id: Option<DbId>,
        crm_person_id: Option<DbId>,
    ) {
        let now = Utc::now();
        let contact = Contact {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: email.to_string(),
            full_name: None,
            company_name: None,
            crm_org_id,
            crm_person_id,
            outreach_removed_at: Some(now),
            created_at: now,
            updated_at: now,
        };
        self.contacts
            .lock()
            .unwrap()
            .insert(email.to_lowercase(), contact);
    }

    fn materialize(&self, entry: &NewSyncLog) -> SyncLogEntry {
        let now = Utc::now();
        SyncLogEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            campaign_id: entry.campaign_id.clone(),
            campaign_name: entry.campaign_name.clone(),
            lead_email: entry.lead_email.clone(),
            event_type: entry.event_type.clone(),
            outcome: entry.outcome.clone(),
            skip_reason: entry.skip_reason.clone(),
            error_message: entry.error_message.clone(),
            attempt_count: 1,
            crm_org_id: entry.crm_org_id,
            crm_person_id: entry.crm_person_id,
            org_created: entry.org_created,
            person_created: entry.person_created,
            post_deletion: entry.post_deletion,
            reply_sentiment: entry.reply_sentiment.clone(),
            source: entry.source.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl SyncStore for MemorySyncStore {
    async fn find_contact(&self, email: &str) -> Result<Option<Contact>, SyncError> {
        Ok(self.contacts.lock().unwrap().get(&email.to_lowercase()).cloned())
    }

    async fn record(&self, entry: NewSyncLog, dedupe: bool) -> Result<SyncLogEntry, SyncError> {
        let mut logs = self.logs.lock().unwrap();
        let existing = logs.iter_mut().rev().find(|row| {
            row.campaign_id == entry.campaign_id
                && row.lead_email == entry.lead_email
                && row.event_type == entry.event_type
        });

        if let Some(row) = existing {
            if dedupe || row.outcome == outcome::ERROR {
                row.outcome = entry.outcome.clone();
                row.skip_reason = entry.skip_reason.clone();
                row.error_message = entry.error_message.clone();
                row.crm_org_id = entry.crm_org_id.or(row.crm_org_id);
                row.crm_person_id = entry.crm_person_id.or(row.crm_person_id);
                row.org_created = entry.org_created;
                row.person_created = entry.person_created;
                row.post_deletion = entry.post_deletion;
                row.reply_sentiment =
                    entry.reply_sentiment.clone().or(row.reply_sentiment.clone());
                row.attempt_count += 1;
                row.updated_at = Utc::now();
                return Ok(row.clone());
            }
        }

        let row = self.materialize(&entry);
        logs.push(row.clone());
        Ok(row)
    }

    async fn list_failed(&self) -> Result<Vec<SyncLogEntry>, SyncError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.outcome == outcome::ERROR)
            .cloned()
            .collect())
    }

    async fn find_failed(
        &self,
        campaign_id: &str,
        lead_email: &str,
        event_type: &str,
    ) -> Result<Option<SyncLogEntry>, SyncError> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|row| {
                row.campaign_id == campaign_id
                    && row.lead_email == lead_email
                    && row.event_type == event_type
            })
            .filter(|row| row.outcome == outcome::ERROR)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryBackfillStore
// ---------------------------------------------------------------------------

/// In-memory [`BackfillStore`].
#[derive(Default)]
pub struct MemoryBackfillStore {
    batches: Mutex<HashMap<DbId, BackfillBatch>>,
    leads: Mutex<Vec<BackfillLead>>,
    contacts: Mutex<HashMap<String, Contact>>,
    next_id: AtomicI64,
}

impl MemoryBackfillStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn batch(&self, id: DbId) -> BackfillBatch {
        self.batches.lock().unwrap().get(&id).cloned().unwrap()
    }

    pub fn lead_rows(&self, batch_id: DbId) -> Vec<BackfillLead> {
        self.leads
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.batch_id == batch_id)
            .cloned()
            .collect()
    }

    /// Seed a prior synced lead so the skip-existing path can be tested.
    pub fn seed_synced_lead(&self, campaign_id: &str, lead_email: &str) {
        let now = Utc::now();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.leads.lock().unwrap().push(BackfillLead {
            id,
            batch_id: 0,
            lead_email: lead_email.to_string(),
            campaign_id: campaign_id.to_string(),
            campaign_name: None,
            event_type: "email_sent".into(),
            status: lead_status::SYNCED.into(),
            crm_org_id: None,
            crm_person_id: None,
            error_message: None,
            collected_at: now,
            completed_at: Some(now),
        });
    }
}

#[async_trait]
impl BackfillStore for MemoryBackfillStore {
    async fn create_batch(&self, dry_run: bool) -> Result<BackfillBatch, SyncError> {
        let now = Utc::now();
        let batch = BackfillBatch {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            status: batch_status::PENDING.into(),
            dry_run,
            total_leads: 0,
            synced_count: 0,
            skipped_count: 0,
            failed_count: 0,
            current_campaign_index: 0,
            current_campaign_name: None,
            campaign_count: 0,
            started_at: Some(now),
            completed_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        self.batches.lock().unwrap().insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn find_batch(&self, id: DbId) -> Result<Option<BackfillBatch>, SyncError> {
        Ok(self.batches.lock().unwrap().get(&id).cloned())
    }

    async fn find_active_batch(&self) -> Result<Option<BackfillBatch>, SyncError> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .values()
            .filter(|b| {
                matches!(
                    b.status.as_str(),
                    batch_status::PENDING
                        | batch_status::COLLECTING
                        | batch_status::PROCESSING
                        | batch_status::PAUSED
                )
            })
            .max_by_key(|b| b.id)
            .cloned())
    }

    async fn set_batch_status(
        &self,
        id: DbId,
        status: &str,
    ) -> Result<Option<BackfillBatch>, SyncError> {
        let mut batches = self.batches.lock().unwrap();
        Ok(batches.get_mut(&id).map(|batch| {
            batch.status = status.to_string();
            if matches!(
                status,
                batch_status::COMPLETED | batch_status::FAILED | batch_status::CANCELLED
            ) {
                batch.completed_at = Some(Utc::now());
            }
            batch.updated_at = Utc::now();
            batch.clone()
        }))
    }

    async fn set_collection_progress(
        &self,
        id: DbId,
        campaign_index: i32,
        campaign_name: &str,
        campaign_count: i32,
    ) -> Result<(), SyncError> {
        if let Some(batch) = self.batches.lock().unwrap().get_mut(&id) {
            batch.current_campaign_index = campaign_index;
            batch.current_campaign_name = Some(campaign_name.to_string());
            batch.campaign_count = campaign_count;
        }
        Ok(())
    }

    async fn set_total_leads(&self, id: DbId, total: i32) -> Result<(), SyncError> {
        if let Some(batch) = self.batches.lock().unwrap().get_mut(&id) {
            batch.total_leads = total;
        }
        Ok(())
    }

    async fn increment_counter(&self, id: DbId, status: &str) -> Result<(), SyncError> {
        if let Some(batch) = self.batches.lock().unwrap().get_mut(&id) {
            match status {
                lead_status::SYNCED => batch.synced_count += 1,
                lead_status::SKIPPED => batch.skipped_count += 1,
                _ => batch.failed_count += 1,
            }
        }
        Ok(())
    }

    async fn mark_batch_failed(&self, id: DbId, error: &str) -> Result<(), SyncError> {
        if let Some(batch) = self.batches.lock().unwrap().get_mut(&id) {
            batch.status = batch_status::FAILED.into();
            batch.last_error = Some(error.to_string());
            batch.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn insert_lead(
        &self,
        batch_id: DbId,
        lead_email: &str,
        campaign_id: &str,
        campaign_name: Option<&str>,
        event_type: &str,
    ) -> Result<bool, SyncError> {
        let mut leads = self.leads.lock().unwrap();
        let exists = leads.iter().any(|l| {
            l.batch_id == batch_id && l.campaign_id == campaign_id && l.lead_email == lead_email
        });
        if exists {
            return Ok(false);
        }
        leads.push(BackfillLead {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            batch_id,
            lead_email: lead_email.to_string(),
            campaign_id: campaign_id.to_string(),
            campaign_name: campaign_name.map(String::from),
            event_type: event_type.to_string(),
            status: lead_status::PENDING.into(),
            crm_org_id: None,
            crm_person_id: None,
            error_message: None,
            collected_at: Utc::now(),
            completed_at: None,
        });
        Ok(true)
    }

    async fn list_pending_leads(
        &self,
        batch_id: DbId,
        limit: i64,
    ) -> Result<Vec<BackfillLead>, SyncError> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.batch_id == batch_id && l.status == lead_status::PENDING)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_pending_leads(&self, batch_id: DbId) -> Result<i64, SyncError> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.batch_id == batch_id && l.status == lead_status::PENDING)
            .count() as i64)
    }

    async fn count_leads(&self, batch_id: DbId) -> Result<i64, SyncError> {
        Ok(self
            .leads
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.batch_id == batch_id)
            .count() as i64)
    }

    async fn mark_lead(
        &self,
        lead_id: DbId,
        status: &str,
        crm_org_id: Option<DbId>,
        crm_person_id: Option<DbId>,
        error_message: Option<&str>,
    ) -> Result<(), SyncError> {
        let mut leads = self.leads.lock().unwrap();
        if let Some(lead) = leads.iter_mut().find(|l| l.id == lead_id) {
            lead.status = status.to_string();
            lead.crm_org_id = crm_org_id;
            lead.crm_person_id = crm_person_id;
            lead.error_message = error_message.map(String::from);
            lead.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn was_lead_synced(
        &self,
        campaign_id: &str,
        lead_email: &str,
    ) -> Result<bool, SyncError> {
        Ok(self.leads.lock().unwrap().iter().any(|l| {
            l.campaign_id == campaign_id
                && l.lead_email == lead_email
                && l.status == lead_status::SYNCED
        }))
    }

    async fn find_contact(&self, email: &str) -> Result<Option<Contact>, SyncError> {
        Ok(self.contacts.lock().unwrap().get(&email.to_lowercase()).cloned())
    }
}

// ---------------------------------------------------------------------------
// MemoryWatchdogStore
// ---------------------------------------------------------------------------

/// In-memory [`WatchdogStore`] with seeding helpers.
#[derive(Default)]
pub struct MemoryWatchdogStore {
    job_runs: Mutex<Vec<CronJobLogEntry>>,
    alerts: Mutex<Vec<WatchdogAlert>>,
    next_id: AtomicI64,
}

impl MemoryWatchdogStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn seed_job_run(&self, job_name: &str, status: &str, started_at: chrono::DateTime<Utc>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.job_runs.lock().unwrap().push(CronJobLogEntry {
            id,
            job_name: job_name.to_string(),
            job_path: format!("/api/cron/{job_name}"),
            status: status.to_string(),
            duration_ms: Some(1200),
            started_at,
            completed_at: Some(started_at),
            response_summary: None,
            created_at: started_at,
        });
    }

    pub fn seed_alert(&self, job_name: &str, alert_type: &str, created_at: chrono::DateTime<Utc>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.alerts.lock().unwrap().push(WatchdogAlert {
            id,
            job_name: job_name.to_string(),
            alert_type: alert_type.to_string(),
            message: "seeded".into(),
            created_at,
        });
    }

    pub fn alerts(&self) -> Vec<WatchdogAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WatchdogStore for MemoryWatchdogStore {
    async fn latest_job_run(
        &self,
        job_name: &str,
    ) -> Result<Option<CronJobLogEntry>, SyncError> {
        Ok(self
            .job_runs
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.job_name == job_name)
            .max_by_key(|r| r.started_at)
            .cloned())
    }

    async fn latest_alert(
        &self,
        job_name: &str,
        alert_type: &str,
    ) -> Result<Option<WatchdogAlert>, SyncError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.job_name == job_name && a.alert_type == alert_type)
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn insert_alert(
        &self,
        job_name: &str,
        alert_type: &str,
        message: &str,
    ) -> Result<WatchdogAlert, SyncError> {
        let alert = WatchdogAlert {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            job_name: job_name.to_string(),
            alert_type: alert_type.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
        };
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(alert)
    }
}

// ---------------------------------------------------------------------------
// FakeOutreach
// ---------------------------------------------------------------------------

/// In-memory outreach platform: tagged campaigns with paginated leads.
#[derive(Default)]
pub struct FakeOutreach {
    campaigns: Mutex<Vec<Campaign>>,
    leads: Mutex<HashMap<String, Vec<Lead>>>,
    page_size_cap: u32,
    fetch_calls: AtomicUsize,
    fail_fetch: AtomicBool,
}

impl FakeOutreach {
    pub fn new() -> Self {
        Self {
            page_size_cap: 100,
            ..Default::default()
        }
    }

    pub fn add_campaign(&self, id: &str, name: &str, leads: Vec<Lead>) {
        self.campaigns.lock().unwrap().push(Campaign {
            id: id.to_string(),
            name: name.to_string(),
            status: "active".into(),
            tags: vec!["crm-sync".into()],
            lead_count: leads.len() as i64,
            opened_count: 0,
            replied_count: 0,
        });
        self.leads.lock().unwrap().insert(id.to_string(), leads);
    }

    pub fn set_campaign_status(&self, id: &str, status: &str) {
        let mut campaigns = self.campaigns.lock().unwrap();
        if let Some(campaign) = campaigns.iter_mut().find(|c| c.id == id) {
            campaign.status = status.to_string();
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Make the next lead fetch fail with a 500.
    pub fn fail_next_fetch(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }
}

/// A minimal active lead.
pub fn lead(email: &str) -> Lead {
    Lead {
        email: email.to_string(),
        first_name: Some("Jane".into()),
        last_name: Some("Doe".into()),
        company_name: Some("Acme".into()),
        status: Some("active".into()),
        reply_sentiment: None,
    }
}

#[async_trait]
impl OutreachApi for FakeOutreach {
    async fn list_tagged_campaigns(&self, tag: &str) -> Result<Vec<Campaign>, OutreachError> {
        Ok(self
            .campaigns
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.tags.iter().any(|t| t == tag))
            .cloned()
            .collect())
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, OutreachError> {
        Ok(self.campaigns.lock().unwrap().clone())
    }

    async fn fetch_leads(
        &self,
        campaign_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<LeadPage, OutreachError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.swap(false, Ordering::SeqCst) {
            return Err(OutreachError::ApiError {
                status: 500,
                body: "injected failure".into(),
            });
        }
        let leads = self.leads.lock().unwrap();
        let all = leads.get(campaign_id).cloned().unwrap_or_default();
        let start: usize = cursor.map(|c| c.parse().unwrap_or(0)).unwrap_or(0);
        let limit = limit.min(self.page_size_cap) as usize;
        let page: Vec<Lead> = all.iter().skip(start).take(limit).cloned().collect();
        let end = start + page.len();
        let next_cursor = (end < all.len()).then(|| end.to_string());
        Ok(LeadPage {
            leads: page,
            next_cursor,
        })
    }

    async fn ensure_webhook(&self, _url: &str, _types: &[&str]) -> Result<(), OutreachError> {
        Ok(())
    }
}
