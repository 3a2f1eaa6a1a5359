//! REST client for the outreach platform HTTP API.

use async_trait::async_trait;
use serde::Deserialize;

use crate::types::{Campaign, LeadPage, WebhookSubscription};
use crate::OutreachApi;

/// Errors from the outreach platform API layer.
#[derive(Debug, thiserror::Error)]
pub enum OutreachError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The platform returned a non-2xx status code.
    #[error("Outreach API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

/// HTTP client for the outreach platform.
pub struct OutreachClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CampaignList {
    campaigns: Vec<Campaign>,
}

#[derive(Debug, Deserialize)]
struct WebhookList {
    webhooks: Vec<WebhookSubscription>,
}

impl OutreachClient {
    /// Create a new client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `https://api.outreach.example`.
    /// * `api_key` - Bearer token for the platform API.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across clients).
    pub fn with_client(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.api_url))
            .bearer_auth(&self.api_key)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.api_url))
            .bearer_auth(&self.api_key)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`OutreachError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, OutreachError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OutreachError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, OutreachError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), OutreachError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl OutreachApi for OutreachClient {
    async fn list_tagged_campaigns(&self, tag: &str) -> Result<Vec<Campaign>, OutreachError> {
        let response = self
            .get("/api/v2/campaigns")
            .query(&[("tag", tag)])
            .send()
            .await?;
        let list: CampaignList = Self::parse_response(response).await?;
        Ok(list.campaigns)
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, OutreachError> {
        let response = self.get("/api/v2/campaigns").send().await?;
        let list: CampaignList = Self::parse_response(response).await?;
        Ok(list.campaigns)
    }

    async fn fetch_leads(
        &self,
        campaign_id: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<LeadPage, OutreachError> {
        let mut request = self
            .get(&format!("/api/v2/campaigns/{campaign_id}/leads"))
            .query(&[("limit", limit.to_string())]);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    async fn ensure_webhook(
        &self,
        url: &str,
        event_types: &[&str],
    ) -> Result<(), OutreachError> {
        // Replace-by-URL: remove any stale subscription for the same
        // URL first so the event list cannot drift from the allow-list.
        let response = self.get("/api/v2/webhooks").send().await?;
        let existing: WebhookList = Self::parse_response(response).await?;
        for webhook in existing.webhooks.iter().filter(|w| w.url == url) {
            let response = self
                .client
                .delete(format!("{}/api/v2/webhooks/{}", self.api_url, webhook.id))
                .bearer_auth(&self.api_key)
                .send()
                .await?;
            Self::check_status(response).await?;
        }

        let body = serde_json::json!({
            "url": url,
            "event_types": event_types,
        });
        let response = self.post("/api/v2/webhooks").json(&body).send().await?;
        Self::check_status(response).await?;

        tracing::info!(url, event_count = event_types.len(), "Webhook subscription ensured");
        Ok(())
    }
}
