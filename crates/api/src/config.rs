use std::time::Duration;

use chrono::Duration as ChronoDuration;

/// One scheduled job the watchdog monitors, as configured.
#[derive(Debug, Clone)]
pub struct WatchdogJobConfig {
    pub name: String,
    pub interval_minutes: i64,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the external API credentials have sensible
/// defaults suitable for local development. In production, override
/// via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`, above the
    /// backfill time budget so a budgeted run is never cut off by the
    /// outer timeout).
    pub request_timeout_secs: u64,

    /// Base URL of the outreach platform API.
    pub outreach_api_url: String,
    /// API key for the outreach platform.
    pub outreach_api_key: String,
    /// Base URL of the CRM API.
    pub crm_api_url: String,
    /// API token for the CRM.
    pub crm_api_token: String,

    /// Shared secret for the webhook endpoint. `None` leaves the
    /// endpoint open.
    pub webhook_secret: Option<String>,
    /// Public URL the outreach platform should deliver webhooks to.
    /// When set, the subscription is (re)registered at startup.
    pub webhook_public_url: Option<String>,
    /// Chat-ops incoming webhook for watchdog alerts. `None` means
    /// alerts are log-only.
    pub chatops_webhook_url: Option<String>,

    /// Tag marking campaigns eligible for sync.
    pub campaign_tag: String,
    /// Wall-clock budget for one backfill run invocation.
    pub backfill_time_budget: Duration,
    /// Jobs the cron watchdog monitors.
    pub watchdog_jobs: Vec<WatchdogJobConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                         |
    /// |---------------------------|---------------------------------|
    /// | `HOST`                    | `0.0.0.0`                       |
    /// | `PORT`                    | `3000`                          |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS`    | `300`                           |
    /// | `OUTREACH_API_URL`        | (required)                      |
    /// | `OUTREACH_API_KEY`        | (required)                      |
    /// | `CRM_API_URL`             | (required)                      |
    /// | `CRM_API_TOKEN`           | (required)                      |
    /// | `SYNC_WEBHOOK_SECRET`     | unset -> open endpoint          |
    /// | `SYNC_WEBHOOK_PUBLIC_URL` | unset -> no startup registration|
    /// | `CHATOPS_WEBHOOK_URL`     | unset -> log-only alerts        |
    /// | `CAMPAIGN_TAG`            | `crm-sync`                      |
    /// | `BACKFILL_TIME_BUDGET_MS` | `240000`                        |
    /// | `WATCHDOG_JOBS`           | `lead-scrape:60,sync-retry:1440`|
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let outreach_api_url =
            std::env::var("OUTREACH_API_URL").expect("OUTREACH_API_URL must be set");
        let outreach_api_key =
            std::env::var("OUTREACH_API_KEY").expect("OUTREACH_API_KEY must be set");
        let crm_api_url = std::env::var("CRM_API_URL").expect("CRM_API_URL must be set");
        let crm_api_token = std::env::var("CRM_API_TOKEN").expect("CRM_API_TOKEN must be set");

        let webhook_secret = std::env::var("SYNC_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());
        let webhook_public_url = std::env::var("SYNC_WEBHOOK_PUBLIC_URL").ok();
        let chatops_webhook_url = std::env::var("CHATOPS_WEBHOOK_URL").ok();

        let campaign_tag = std::env::var("CAMPAIGN_TAG").unwrap_or_else(|_| "crm-sync".into());

        let backfill_budget_ms: u64 = std::env::var("BACKFILL_TIME_BUDGET_MS")
            .unwrap_or_else(|_| "240000".into())
            .parse()
            .expect("BACKFILL_TIME_BUDGET_MS must be a valid u64");

        let watchdog_jobs = parse_watchdog_jobs(
            &std::env::var("WATCHDOG_JOBS")
                .unwrap_or_else(|_| "lead-scrape:60,sync-retry:1440".into()),
        );

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            outreach_api_url,
            outreach_api_key,
            crm_api_url,
            crm_api_token,
            webhook_secret,
            webhook_public_url,
            chatops_webhook_url,
            campaign_tag,
            backfill_time_budget: Duration::from_millis(backfill_budget_ms),
            watchdog_jobs,
        }
    }

    /// Monitored jobs converted for the watchdog.
    pub fn monitored_jobs(&self) -> Vec<leadbridge_sync::watchdog::MonitoredJob> {
        self.watchdog_jobs
            .iter()
            .map(|job| {
                leadbridge_sync::watchdog::MonitoredJob::new(
                    &job.name,
                    ChronoDuration::minutes(job.interval_minutes),
                )
            })
            .collect()
    }
}

/// Parse `name:interval_minutes` pairs from a comma-separated list.
/// Malformed entries panic at startup; misconfiguration should fail fast.
fn parse_watchdog_jobs(raw: &str) -> Vec<WatchdogJobConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (name, minutes) = entry
                .split_once(':')
                .unwrap_or_else(|| panic!("Invalid WATCHDOG_JOBS entry '{entry}'"));
            WatchdogJobConfig {
                name: name.trim().to_string(),
                interval_minutes: minutes
                    .trim()
                    .parse()
                    .unwrap_or_else(|_| panic!("Invalid interval in WATCHDOG_JOBS entry '{entry}'")),
            }
        })
        .collect()
}
