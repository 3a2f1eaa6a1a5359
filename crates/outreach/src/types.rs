//! Wire types for the outreach platform API.

use serde::{Deserialize, Serialize};

/// One outreach campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    /// Platform-side campaign status (`active`, `paused`, `completed`).
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lead_count: i64,
    #[serde(default)]
    pub opened_count: i64,
    #[serde(default)]
    pub replied_count: i64,
}

/// One lead within a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    /// Lead status within the campaign (`active`, `completed`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Sentiment of the lead's latest reply, when the platform has
    /// classified one (`positive`, `negative`, `neutral`).
    #[serde(default)]
    pub reply_sentiment: Option<String>,
}

/// One page of leads plus the cursor for the next page.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadPage {
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// An existing webhook subscription on the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSubscription {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub event_types: Vec<String>,
}
