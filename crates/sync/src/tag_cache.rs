//! Campaign tag filter cache.
//!
//! Avoids a full campaign-list API call per webhook: the set of
//! campaign ids carrying the sync tag is cached in process and
//! refreshed after a TTL. On refresh failure the stale set keeps
//! serving (availability over freshness); a refresh-in-progress flag
//! prevents a refresh storm under burst traffic.
//!
//! The cache is an explicit component with an injected client and
//! clock, owned by the composition root, so tests can assert refresh
//! timing deterministically.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use leadbridge_outreach::OutreachApi;

/// Default time-to-live for the cached campaign set.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Monotonic time source, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by [`Instant::now`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheState {
    ids: HashSet<String>,
    refreshed_at: Option<Instant>,
}

/// In-memory set of campaign ids eligible for sync.
pub struct CampaignTagCache {
    outreach: Arc<dyn OutreachApi>,
    tag: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
    refreshing: AtomicBool,
}

impl CampaignTagCache {
    pub fn new(outreach: Arc<dyn OutreachApi>, tag: impl Into<String>) -> Self {
        Self::with_clock(outreach, tag, DEFAULT_TTL, Arc::new(SystemClock))
    }

    pub fn with_clock(
        outreach: Arc<dyn OutreachApi>,
        tag: impl Into<String>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            outreach,
            tag: tag.into(),
            ttl,
            clock,
            state: RwLock::new(CacheState {
                ids: HashSet::new(),
                refreshed_at: None,
            }),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Whether the campaign is eligible for sync.
    ///
    /// Refreshes the cached set first when it is cold or past its TTL.
    /// On a cold start with a failing platform API this returns `false`
    /// for everything until the next successful refresh.
    pub async fn contains(&self, campaign_id: &str) -> bool {
        self.refresh_if_stale().await;
        self.state.read().await.ids.contains(campaign_id)
    }

    /// Snapshot of the current campaign id set (post-refresh).
    pub async fn get(&self) -> HashSet<String> {
        self.refresh_if_stale().await;
        self.state.read().await.ids.clone()
    }

    async fn refresh_if_stale(&self) {
        let stale = {
            let state = self.state.read().await;
            match state.refreshed_at {
                Some(at) => self.clock.now().duration_since(at) >= self.ttl,
                None => true,
            }
        };
        if !stale {
            return;
        }

        // Only one caller refreshes; concurrent callers serve the
        // previous set rather than piling onto the platform API.
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        match self.outreach.list_tagged_campaigns(&self.tag).await {
            Ok(campaigns) => {
                let ids: HashSet<String> = campaigns.into_iter().map(|c| c.id).collect();
                let mut state = self.state.write().await;
                // Replaced atomically, never mutated incrementally.
                state.ids = ids;
                state.refreshed_at = Some(self.clock.now());
                tracing::debug!(count = state.ids.len(), tag = %self.tag, "Campaign tag cache refreshed");
            }
            Err(e) => {
                tracing::warn!(error = %e, tag = %self.tag, "Campaign tag cache refresh failed, serving stale set");
                // Bump the refresh timestamp on failure too, so a down
                // platform API is retried once per TTL, not per event.
                let mut state = self.state.write().await;
                if state.refreshed_at.is_some() {
                    state.refreshed_at = Some(self.clock.now());
                }
            }
        }

        self.refreshing.store(false, Ordering::Release);
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    //! Shared fixtures for modules that need a populated tag cache.

    use super::*;

    use async_trait::async_trait;
    use leadbridge_outreach::{Campaign, LeadPage, OutreachError};

    pub const FIXED_CAMPAIGN: &str = "camp-tagged";

    struct StaticOutreach;

    #[async_trait]
    impl OutreachApi for StaticOutreach {
        async fn list_tagged_campaigns(
            &self,
            _tag: &str,
        ) -> Result<Vec<Campaign>, OutreachError> {
            Ok(vec![Campaign {
                id: FIXED_CAMPAIGN.into(),
                name: "Tagged".into(),
                status: "active".into(),
                tags: vec!["crm-sync".into()],
                lead_count: 0,
                opened_count: 0,
                replied_count: 0,
            }])
        }

        async fn list_campaigns(&self) -> Result<Vec<Campaign>, OutreachError> {
            self.list_tagged_campaigns("").await
        }

        async fn fetch_leads(
            &self,
            _campaign_id: &str,
            _cursor: Option<&str>,
            _limit: u32,
        ) -> Result<LeadPage, OutreachError> {
            Ok(LeadPage {
                leads: vec![],
                next_cursor: None,
            })
        }

        async fn ensure_webhook(
            &self,
            _url: &str,
            _event_types: &[&str],
        ) -> Result<(), OutreachError> {
            Ok(())
        }
    }

    /// A cache whose only tagged campaign is [`FIXED_CAMPAIGN`].
    pub fn fixed_cache() -> Arc<CampaignTagCache> {
        Arc::new(CampaignTagCache::new(Arc::new(StaticOutreach), "crm-sync"))
    }
}
