//! CRM pipeline status precedence.
//!
//! The sync engine must never regress a lead's CRM status: a late
//! "email opened" event must not overwrite "meeting booked". Each
//! status carries a rank; a mutation only applies when the candidate
//! rank is strictly greater than the current one.
//!
//! Negative terminal signals (bounced/unsubscribed/not-interested)
//! rank below positive outcomes so a late positive reply can still
//! upgrade the record.

use serde::{Deserialize, Serialize};

use crate::events::SyncEventType;

/// CRM pipeline status for a synced person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    New,
    Contacted,
    Bounced,
    Unsubscribed,
    Replied,
    NotInterested,
    Interested,
    MeetingBooked,
    MeetingCompleted,
    Closed,
}

impl PipelineStatus {
    /// Monotonic precedence rank. Gaps leave room for later stages.
    pub fn rank(&self) -> u8 {
        match self {
            PipelineStatus::New => 0,
            PipelineStatus::Contacted => 10,
            PipelineStatus::Bounced => 20,
            PipelineStatus::Unsubscribed => 25,
            PipelineStatus::Replied => 30,
            PipelineStatus::NotInterested => 35,
            PipelineStatus::Interested => 40,
            PipelineStatus::MeetingBooked => 50,
            PipelineStatus::MeetingCompleted => 60,
            PipelineStatus::Closed => 70,
        }
    }

    /// Stable wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::New => "new",
            PipelineStatus::Contacted => "contacted",
            PipelineStatus::Bounced => "bounced",
            PipelineStatus::Unsubscribed => "unsubscribed",
            PipelineStatus::Replied => "replied",
            PipelineStatus::NotInterested => "not_interested",
            PipelineStatus::Interested => "interested",
            PipelineStatus::MeetingBooked => "meeting_booked",
            PipelineStatus::MeetingCompleted => "meeting_completed",
            PipelineStatus::Closed => "closed",
        }
    }

    /// Parse the database/CRM representation. Unknown values map to
    /// `None` (treated as rank 0 by callers).
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(PipelineStatus::New),
            "contacted" => Some(PipelineStatus::Contacted),
            "bounced" => Some(PipelineStatus::Bounced),
            "unsubscribed" => Some(PipelineStatus::Unsubscribed),
            "replied" => Some(PipelineStatus::Replied),
            "not_interested" => Some(PipelineStatus::NotInterested),
            "interested" => Some(PipelineStatus::Interested),
            "meeting_booked" => Some(PipelineStatus::MeetingBooked),
            "meeting_completed" => Some(PipelineStatus::MeetingCompleted),
            "closed" => Some(PipelineStatus::Closed),
            _ => None,
        }
    }

    /// The status a sync event targets, or `None` for note-only events.
    pub fn for_event(event: SyncEventType) -> Option<Self> {
        match event {
            SyncEventType::EmailSent
            | SyncEventType::EmailOpened
            | SyncEventType::EmailClicked
            | SyncEventType::CampaignCompleted => None,
            SyncEventType::EmailBounced => Some(PipelineStatus::Bounced),
            SyncEventType::LeadUnsubscribed => Some(PipelineStatus::Unsubscribed),
            SyncEventType::LeadInterested => Some(PipelineStatus::Interested),
            SyncEventType::LeadNotInterested => Some(PipelineStatus::NotInterested),
            SyncEventType::LeadNeutral => Some(PipelineStatus::Replied),
            SyncEventType::MeetingBooked => Some(PipelineStatus::MeetingBooked),
            SyncEventType::MeetingCompleted => Some(PipelineStatus::MeetingCompleted),
            SyncEventType::LeadClosed => Some(PipelineStatus::Closed),
        }
    }

    /// Decide whether `candidate` may replace `current`.
    ///
    /// Returns the status to write, or `None` when the current status
    /// already outranks (or equals) the candidate.
    pub fn advance(current: Option<PipelineStatus>, candidate: PipelineStatus) -> Option<Self> {
        match current {
            Some(cur) if cur.rank() >= candidate.rank() => None,
            _ => Some(candidate),
        }
    }
}
