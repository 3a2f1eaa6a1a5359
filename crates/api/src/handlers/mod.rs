pub mod backfill;
pub mod retry;
pub mod watchdog;
pub mod webhook;
