//! Cross-platform event synchronization engine.
//!
//! Ingests classified engagement events from the outreach platform and
//! projects them idempotently onto the CRM; drives the resumable bulk
//! backfill, the failed-sync retry queue, the campaign-tag filter
//! cache, and the scheduled-job watchdog.

pub mod backfill;
pub mod classifier;
pub mod engine;
pub mod guard;
pub mod notify;
pub mod retry;
pub mod store;
pub mod tag_cache;
pub mod watchdog;

#[cfg(test)]
pub(crate) mod testing;

use leadbridge_crm::CrmError;
use leadbridge_outreach::OutreachError;

/// Errors crossing the sync subsystem's internal seams.
///
/// Note that the sync engine itself never lets these escape to its
/// callers: per-event failures are converted into a structured
/// [`engine::SyncReport`]. This type is for the orchestration layers
/// (backfill, retry, watchdog) where a store failure is fatal to the
/// surrounding operation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    Crm(#[from] CrmError),

    #[error(transparent)]
    Outreach(#[from] OutreachError),
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Store(err.to_string())
    }
}
