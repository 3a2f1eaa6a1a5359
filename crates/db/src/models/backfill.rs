//! Backfill entity models.
//!
//! A `backfill_batches` row tracks one bulk run; `backfill_leads` rows
//! track each discovered lead within it. Both transition forward only,
//! which is what makes a budget-interrupted run resumable.

use serde::Serialize;
use sqlx::FromRow;

use leadbridge_core::types::{DbId, Timestamp};

/// Well-known batch status values stored in `backfill_batches.status`.
///
/// Monotonic except `paused` -> `processing` on manual resume.
pub mod batch_status {
    pub const PENDING: &str = "pending";
    pub const COLLECTING: &str = "collecting";
    pub const PROCESSING: &str = "processing";
    pub const COMPLETED: &str = "completed";
    pub const FAILED: &str = "failed";
    pub const CANCELLED: &str = "cancelled";
    pub const PAUSED: &str = "paused";
}

/// Well-known lead status values stored in `backfill_leads.status`.
pub mod lead_status {
    pub const PENDING: &str = "pending";
    pub const PROCESSING: &str = "processing";
    pub const SYNCED: &str = "synced";
    pub const SKIPPED: &str = "skipped";
    pub const FAILED: &str = "failed";
}

/// A row from the `backfill_batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BackfillBatch {
    pub id: DbId,
    pub status: String,
    pub dry_run: bool,
    pub total_leads: i32,
    pub synced_count: i32,
    pub skipped_count: i32,
    pub failed_count: i32,
    pub current_campaign_index: i32,
    pub current_campaign_name: Option<String>,
    pub campaign_count: i32,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `backfill_leads` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BackfillLead {
    pub id: DbId,
    pub batch_id: DbId,
    pub lead_email: String,
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub event_type: String,
    pub status: String,
    pub crm_org_id: Option<DbId>,
    pub crm_person_id: Option<DbId>,
    pub error_message: Option<String>,
    pub collected_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}
