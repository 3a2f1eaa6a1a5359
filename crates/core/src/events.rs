//! Sync-event taxonomy.
//!
//! Maps raw outreach-platform webhook event types onto the internal
//! taxonomy the sync engine operates on. The allow-list here is the
//! single authoritative list: the webhook subscription setup and the
//! classifier both derive from [`SyncEventType::from_wire`], so the
//! reply/interest exclusion rule is stated exactly once.

use serde::{Deserialize, Serialize};

/// One classified, in-scope engagement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEventType {
    EmailSent,
    EmailOpened,
    EmailClicked,
    EmailBounced,
    LeadUnsubscribed,
    LeadInterested,
    LeadNotInterested,
    LeadNeutral,
    MeetingBooked,
    MeetingCompleted,
    LeadClosed,
    CampaignCompleted,
}

/// Broad category of a sync event, used for routing decisions
/// (post-deletion guard, note formatting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    /// Pure telemetry: sent/opened/clicked. Never changes status.
    Engagement,
    /// Deliverability/consent signals: bounce, unsubscribe.
    Critical,
    /// Reply classified by sentiment.
    Interest,
    /// Meeting lifecycle.
    Meeting,
    /// Campaign-level or pipeline-terminal events.
    Special,
}

/// Why an incoming event was not handed to the sync engine, or why the
/// engine declined to mutate the CRM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The campaign does not carry the sync tag.
    CampaignNotTagged,
    /// The wire event type is outside the supported set.
    UnsupportedEventType,
    /// `reply_received` is excluded: the platform emits a separate
    /// interest event carrying sentiment for the same reply, and
    /// processing both would duplicate CRM notes and status changes.
    ReplyHandledViaInterest,
    /// The payload carried no lead email, so there is no identity to
    /// sync against.
    MissingLeadEmail,
    /// The lead was removed from the outreach platform and the event
    /// is not a reply-type event worth recording.
    PostDeletionDrop,
    /// The lead already carries synced CRM ids (backfill fast path).
    AlreadySynced,
    /// Dry-run mode: effects were computed but not applied.
    DryRun,
}

impl SkipReason {
    /// Stable wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::CampaignNotTagged => "campaign_not_tagged",
            SkipReason::UnsupportedEventType => "unsupported_event_type",
            SkipReason::ReplyHandledViaInterest => "reply_handled_via_interest",
            SkipReason::MissingLeadEmail => "missing_lead_email",
            SkipReason::PostDeletionDrop => "post_deletion_drop",
            SkipReason::AlreadySynced => "already_synced",
            SkipReason::DryRun => "dry_run",
        }
    }
}

/// Reply sentiment carried by interest events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySentiment {
    Positive,
    Negative,
    Neutral,
}

impl ReplySentiment {
    /// Stable wire/database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySentiment::Positive => "positive",
            ReplySentiment::Negative => "negative",
            ReplySentiment::Neutral => "neutral",
        }
    }
}

impl SyncEventType {
    /// Parse a wire `event_type` string into the internal taxonomy.
    ///
    /// Returns `Err(SkipReason)` for recognized-but-excluded and
    /// unknown event types so the caller can report a precise reason.
    pub fn from_wire(event_type: &str) -> Result<Self, SkipReason> {
        match event_type {
            "email_sent" => Ok(SyncEventType::EmailSent),
            "email_opened" => Ok(SyncEventType::EmailOpened),
            "email_link_clicked" => Ok(SyncEventType::EmailClicked),
            "email_bounced" => Ok(SyncEventType::EmailBounced),
            "lead_unsubscribed" => Ok(SyncEventType::LeadUnsubscribed),
            "lead_interested" => Ok(SyncEventType::LeadInterested),
            "lead_not_interested" => Ok(SyncEventType::LeadNotInterested),
            "lead_neutral" => Ok(SyncEventType::LeadNeutral),
            "lead_meeting_booked" => Ok(SyncEventType::MeetingBooked),
            "lead_meeting_completed" => Ok(SyncEventType::MeetingCompleted),
            "lead_closed" => Ok(SyncEventType::LeadClosed),
            "campaign_completed" => Ok(SyncEventType::CampaignCompleted),
            "reply_received" => Err(SkipReason::ReplyHandledViaInterest),
            _ => Err(SkipReason::UnsupportedEventType),
        }
    }

    /// Stable wire/database representation (matches the platform's
    /// `event_type` strings).
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncEventType::EmailSent => "email_sent",
            SyncEventType::EmailOpened => "email_opened",
            SyncEventType::EmailClicked => "email_link_clicked",
            SyncEventType::EmailBounced => "email_bounced",
            SyncEventType::LeadUnsubscribed => "lead_unsubscribed",
            SyncEventType::LeadInterested => "lead_interested",
            SyncEventType::LeadNotInterested => "lead_not_interested",
            SyncEventType::LeadNeutral => "lead_neutral",
            SyncEventType::MeetingBooked => "lead_meeting_booked",
            SyncEventType::MeetingCompleted => "lead_meeting_completed",
            SyncEventType::LeadClosed => "lead_closed",
            SyncEventType::CampaignCompleted => "campaign_completed",
        }
    }

    /// The full supported set, in wire form. This is what the webhook
    /// setup tool subscribes to on the outreach platform.
    pub fn supported_wire_types() -> &'static [&'static str] {
        &[
            "email_sent",
            "email_opened",
            "email_link_clicked",
            "email_bounced",
            "lead_unsubscribed",
            "lead_interested",
            "lead_not_interested",
            "lead_neutral",
            "lead_meeting_booked",
            "lead_meeting_completed",
            "lead_closed",
            "campaign_completed",
        ]
    }

    pub fn category(&self) -> EventCategory {
        match self {
            SyncEventType::EmailSent
            | SyncEventType::EmailOpened
            | SyncEventType::EmailClicked => EventCategory::Engagement,
            SyncEventType::EmailBounced | SyncEventType::LeadUnsubscribed => {
                EventCategory::Critical
            }
            SyncEventType::LeadInterested
            | SyncEventType::LeadNotInterested
            | SyncEventType::LeadNeutral => EventCategory::Interest,
            SyncEventType::MeetingBooked | SyncEventType::MeetingCompleted => {
                EventCategory::Meeting
            }
            SyncEventType::LeadClosed | SyncEventType::CampaignCompleted => EventCategory::Special,
        }
    }

    /// Whether this event may move the CRM pipeline status. Engagement
    /// events and `campaign_completed` append notes only.
    pub fn is_status_changing(&self) -> bool {
        !matches!(
            self,
            SyncEventType::EmailSent
                | SyncEventType::EmailOpened
                | SyncEventType::EmailClicked
                | SyncEventType::CampaignCompleted
        )
    }

    /// Reply-type events remain business-relevant even after the lead
    /// was removed from the outreach platform (post-deletion guard).
    pub fn is_reply_type(&self) -> bool {
        matches!(self.category(), EventCategory::Interest)
    }

    /// Sentiment implied by interest events; `None` otherwise.
    pub fn sentiment(&self) -> Option<ReplySentiment> {
        match self {
            SyncEventType::LeadInterested => Some(ReplySentiment::Positive),
            SyncEventType::LeadNotInterested => Some(ReplySentiment::Negative),
            SyncEventType::LeadNeutral => Some(ReplySentiment::Neutral),
            _ => None,
        }
    }
}
