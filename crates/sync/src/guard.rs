//! Post-deletion guard.
//!
//! Deleting a lead from the outreach platform is a one-way signal:
//! stop further automated engagement. Telemetry arriving afterward
//! (opens, clicks, bounces) is stale noise and is dropped, but a late
//! reply is still business-relevant and leaves a note-only trace.

use leadbridge_core::events::SyncEventType;
use leadbridge_db::models::contact::Contact;

/// How the sync engine should treat an event for this lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Lead still active on the platform: full sync.
    Proceed,
    /// Lead removed, reply-type event: CRM note only, no re-sync.
    NoteOnly,
    /// Lead removed, non-reply event: drop entirely.
    Drop,
}

/// Decide the treatment given the lead's local contact record.
///
/// A missing contact record means the lead was never tracked locally;
/// the sync proceeds normally.
pub fn decide(contact: Option<&Contact>, event: SyncEventType) -> GuardDecision {
    match contact {
        Some(c) if c.outreach_removed_at.is_some() => {
            if event.is_reply_type() {
                GuardDecision::NoteOnly
            } else {
                GuardDecision::Drop
            }
        }
        _ => GuardDecision::Proceed,
    }
}
