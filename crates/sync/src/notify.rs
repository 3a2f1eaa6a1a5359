//! Outbound chat-ops notifications.

use async_trait::async_trait;

/// Sink for operator-facing alert messages.
///
/// Delivery is best-effort by contract: implementations report
/// failures so callers can log them, but no caller treats a delivery
/// failure as fatal.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), String>;
}

/// Posts alerts to a chat-ops incoming webhook as `{"text": ...}`.
pub struct ChatOpsNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl ChatOpsNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }
}

#[async_trait]
impl AlertSink for ChatOpsNotifier {
    async fn send(&self, text: &str) -> Result<(), String> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("chat-ops webhook returned {}", response.status()));
        }
        Ok(())
    }
}

/// Sink used when no chat-ops webhook is configured: alerts are only
/// written to the log.
pub struct LogOnlySink;

#[async_trait]
impl AlertSink for LogOnlySink {
    async fn send(&self, text: &str) -> Result<(), String> {
        tracing::warn!(alert = %text, "Alert (no chat-ops webhook configured)");
        Ok(())
    }
}
