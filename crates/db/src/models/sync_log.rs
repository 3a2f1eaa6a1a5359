//! Sync-log entity models.
//!
//! One `sync_logs` row records one processed engagement event: what
//! happened, which CRM records were touched, and whether the CRM side
//! was created or updated. Failed rows feed the retry subsystem.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use leadbridge_core::types::{DbId, Timestamp};

/// Well-known sync outcome values stored in `sync_logs.outcome`.
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const SKIPPED: &str = "skipped";
    pub const ERROR: &str = "error";
}

/// Well-known sync source values stored in `sync_logs.source`.
pub mod source {
    pub const WEBHOOK: &str = "webhook";
    pub const BACKFILL: &str = "backfill";
}

/// A row from the `sync_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SyncLogEntry {
    pub id: DbId,
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub lead_email: String,
    pub event_type: String,
    pub outcome: String,
    pub skip_reason: Option<String>,
    pub error_message: Option<String>,
    pub attempt_count: i32,
    pub crm_org_id: Option<DbId>,
    pub crm_person_id: Option<DbId>,
    pub org_created: bool,
    pub person_created: bool,
    /// True when this event was recorded after the lead's removal from
    /// the outreach platform (note-only update).
    pub post_deletion: bool,
    pub reply_sentiment: Option<String>,
    pub source: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields for inserting or upserting a sync-log row.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSyncLog {
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub lead_email: String,
    pub event_type: String,
    pub outcome: String,
    pub skip_reason: Option<String>,
    pub error_message: Option<String>,
    pub crm_org_id: Option<DbId>,
    pub crm_person_id: Option<DbId>,
    pub org_created: bool,
    pub person_created: bool,
    pub post_deletion: bool,
    pub reply_sentiment: Option<String>,
    pub source: String,
}
