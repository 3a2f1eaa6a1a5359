//! Scheduled-job health models.
//!
//! `cron_job_logs` rows are written by each scheduled job as it runs;
//! the watchdog only reads them. `watchdog_alerts` rows exist to
//! deduplicate notifications within the cooldown window.

use serde::Serialize;
use sqlx::FromRow;

use leadbridge_core::types::{DbId, Timestamp};

/// Well-known job run status values stored in `cron_job_logs.status`.
pub mod job_status {
    pub const SUCCESS: &str = "success";
    pub const ERROR: &str = "error";
    pub const TIMEOUT: &str = "timeout";
}

/// Well-known alert type values stored in `watchdog_alerts.alert_type`.
pub mod alert_type {
    pub const OVERDUE: &str = "overdue";
    pub const RECOVERED: &str = "recovered";
}

/// A row from the `cron_job_logs` table: one execution of a scheduled job.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CronJobLogEntry {
    pub id: DbId,
    pub job_name: String,
    pub job_path: String,
    pub status: String,
    pub duration_ms: Option<i64>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub response_summary: Option<String>,
    pub created_at: Timestamp,
}

/// A row from the `watchdog_alerts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WatchdogAlert {
    pub id: DbId,
    pub job_name: String,
    pub alert_type: String,
    pub message: String,
    pub created_at: Timestamp,
}
