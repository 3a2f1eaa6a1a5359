//! Event classifier.
//!
//! Maps a raw webhook payload onto the internal sync-event taxonomy
//! and decides whether the event is in scope: campaign tag filter,
//! supported-event filter, and has-email filter, in that order.
//! Structural validation (`event_type`/`campaign_id` must be strings)
//! happens at deserialization in the HTTP layer.

use std::sync::Arc;

use serde::Deserialize;

use leadbridge_core::events::{SkipReason, SyncEventType};

use crate::tag_cache::CampaignTagCache;

/// Raw webhook payload as sent by the outreach platform.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWebhookEvent {
    pub event_type: String,
    pub campaign_id: String,
    #[serde(default)]
    pub campaign_name: Option<String>,
    #[serde(default)]
    pub lead_email: Option<String>,
    #[serde(default)]
    pub lead_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    /// Remaining platform fields, carried through for logging.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A normalized event ready for the guard and sync engine.
#[derive(Debug, Clone)]
pub struct ClassifiedEvent {
    pub event: SyncEventType,
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub lead_email: String,
    pub lead_name: Option<String>,
    pub company_name: Option<String>,
}

/// Outcome of classification.
#[derive(Debug)]
pub enum Classification {
    InScope(ClassifiedEvent),
    /// The event was considered and dropped; the reason is reported
    /// back to the platform with a 200 so it does not retry-storm.
    Dropped(SkipReason),
}

/// Classifies raw webhook events against the campaign tag cache and
/// the supported-event allow-list.
pub struct EventClassifier {
    cache: Arc<CampaignTagCache>,
}

impl EventClassifier {
    pub fn new(cache: Arc<CampaignTagCache>) -> Self {
        Self { cache }
    }

    pub async fn classify(&self, raw: RawWebhookEvent) -> Classification {
        // Events from non-target campaigns must never reach the CRM.
        if !self.cache.contains(&raw.campaign_id).await {
            return Classification::Dropped(SkipReason::CampaignNotTagged);
        }

        let event = match SyncEventType::from_wire(&raw.event_type) {
            Ok(event) => event,
            Err(reason) => return Classification::Dropped(reason),
        };

        let lead_email = match raw.lead_email {
            Some(email) if !email.trim().is_empty() => email,
            _ => return Classification::Dropped(SkipReason::MissingLeadEmail),
        };

        Classification::InScope(ClassifiedEvent {
            event,
            campaign_id: raw.campaign_id,
            campaign_name: raw.campaign_name,
            lead_email,
            lead_name: raw.lead_name,
            company_name: raw.company_name,
        })
    }
}
