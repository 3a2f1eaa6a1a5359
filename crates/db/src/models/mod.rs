//! Row types and DTOs for the sync service tables.

pub mod backfill;
pub mod contact;
pub mod cron;
pub mod sync_log;
