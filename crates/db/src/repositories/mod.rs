//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod backfill_repo;
pub mod contact_repo;
pub mod cron_job_log_repo;
pub mod sync_log_repo;
pub mod watchdog_alert_repo;

pub use backfill_repo::BackfillRepo;
pub use contact_repo::ContactRepo;
pub use cron_job_log_repo::CronJobLogRepo;
pub use sync_log_repo::SyncLogRepo;
pub use watchdog_alert_repo::WatchdogAlertRepo;
