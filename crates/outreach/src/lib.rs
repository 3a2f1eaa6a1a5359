//! Typed HTTP client for the outreach-email platform.
//!
//! Covers the three API surfaces the sync service needs: campaign
//! listing (with tag filter), paginated lead fetching, and webhook
//! subscription management. The [`OutreachApi`] trait is the seam the
//! tag cache and backfill orchestrator are tested through.

pub mod client;
pub mod types;

pub use client::{OutreachClient, OutreachError};
pub use types::{Campaign, Lead, LeadPage};

use async_trait::async_trait;

/// Outreach platform operations consumed by the sync service.
#[async_trait]
pub trait OutreachApi: Send + Sync {
    /// List campaigns carrying the given tag.
    async fn list_tagged_campaigns(&self, tag: &str) -> Result<Vec<Campaign>, OutreachError>;

    /// List all campaigns, with lead/engagement counts.
    async fn list_campaigns(&self) -> Result<Vec<Campaign>, OutreachError>;

    /// Fetch one page of leads for a campaign.
    async fn fetch_leads(
        &self,
        campaign_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<LeadPage, OutreachError>;

    /// Subscribe a webhook URL to the given event types, replacing any
    /// existing subscription for the same URL.
    async fn ensure_webhook(
        &self,
        url: &str,
        event_types: &[&str],
    ) -> Result<(), OutreachError>;
}
