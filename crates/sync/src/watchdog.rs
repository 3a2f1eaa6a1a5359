//! Cron watchdog.
//!
//! Reads the job-run log written by the scheduled jobs themselves and
//! flags jobs that have gone quiet. Alerting is deduplicated on both
//! sides of an incident: one `overdue` alert per cooldown window while
//! the job stays down, and exactly one `recovered` alert once it runs
//! again. The watchdog never writes job-run rows itself.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use leadbridge_db::models::cron::alert_type;

use crate::notify::AlertSink;
use crate::store::WatchdogStore;
use crate::SyncError;

/// Multiplier applied to a job's expected interval before it counts
/// as overdue.
pub const DEFAULT_OVERDUE_MULTIPLIER: f64 = 2.5;

/// Default alert cooldown window in minutes.
pub const DEFAULT_COOLDOWN_MINUTES: i64 = 360;

/// One scheduled job the watchdog keeps an eye on.
#[derive(Debug, Clone)]
pub struct MonitoredJob {
    pub name: String,
    pub expected_interval: Duration,
    pub overdue_multiplier: f64,
}

impl MonitoredJob {
    pub fn new(name: &str, expected_interval: Duration) -> Self {
        Self {
            name: name.to_string(),
            expected_interval,
            overdue_multiplier: DEFAULT_OVERDUE_MULTIPLIER,
        }
    }

    fn overdue_threshold_secs(&self) -> f64 {
        self.expected_interval.num_seconds() as f64 * self.overdue_multiplier
    }
}

/// Health verdict for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Never ran; not alertable.
    NoData,
    Healthy,
    Overdue,
}

/// Per-job result of one watchdog sweep.
#[derive(Debug, Clone, Serialize)]
pub struct JobHealth {
    pub job_name: String,
    pub state: JobState,
    pub last_run_at: Option<leadbridge_core::types::Timestamp>,
    pub last_run_status: Option<String>,
}

/// Aggregate result of one watchdog sweep.
#[derive(Debug, Clone, Serialize)]
pub struct WatchdogReport {
    pub checked: usize,
    pub healthy: usize,
    pub overdue: usize,
    pub no_data: usize,
    pub alerts_sent: usize,
    pub jobs: Vec<JobHealth>,
}

/// Periodic health check over the scheduled jobs.
pub struct CronWatchdog {
    store: Arc<dyn WatchdogStore>,
    sink: Arc<dyn AlertSink>,
    jobs: Vec<MonitoredJob>,
    cooldown: Duration,
}

impl CronWatchdog {
    pub fn new(
        store: Arc<dyn WatchdogStore>,
        sink: Arc<dyn AlertSink>,
        jobs: Vec<MonitoredJob>,
    ) -> Self {
        Self {
            store,
            sink,
            jobs,
            cooldown: Duration::minutes(DEFAULT_COOLDOWN_MINUTES),
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Run one sweep over every monitored job.
    pub async fn run(&self) -> Result<WatchdogReport, SyncError> {
        let now = Utc::now();
        let mut report = WatchdogReport {
            checked: self.jobs.len(),
            healthy: 0,
            overdue: 0,
            no_data: 0,
            alerts_sent: 0,
            jobs: Vec::with_capacity(self.jobs.len()),
        };

        for job in &self.jobs {
            let last_run = self.store.latest_job_run(&job.name).await?;

            let Some(last_run) = last_run else {
                report.no_data += 1;
                report.jobs.push(JobHealth {
                    job_name: job.name.clone(),
                    state: JobState::NoData,
                    last_run_at: None,
                    last_run_status: None,
                });
                continue;
            };

            let elapsed_secs = (now - last_run.started_at).num_seconds() as f64;
            let overdue = elapsed_secs > job.overdue_threshold_secs();

            if overdue {
                report.overdue += 1;
                if self.should_alert_overdue(&job.name, now).await? {
                    let message = format!(
                        "Scheduled job '{}' is overdue: last ran {} minutes ago (expected every {} minutes)",
                        job.name,
                        (elapsed_secs / 60.0).round() as i64,
                        job.expected_interval.num_minutes(),
                    );
                    self.emit(&job.name, alert_type::OVERDUE, &message).await?;
                    report.alerts_sent += 1;
                }
            } else {
                report.healthy += 1;
                if self.should_alert_recovered(&job.name, now).await? {
                    let message = format!(
                        "Scheduled job '{}' recovered: ran {} minutes ago",
                        job.name,
                        (elapsed_secs / 60.0).round() as i64,
                    );
                    self.emit(&job.name, alert_type::RECOVERED, &message).await?;
                    report.alerts_sent += 1;
                }
            }

            report.jobs.push(JobHealth {
                job_name: job.name.clone(),
                state: if overdue { JobState::Overdue } else { JobState::Healthy },
                last_run_at: Some(last_run.started_at),
                last_run_status: Some(last_run.status),
            });
        }

        tracing::info!(
            checked = report.checked,
            overdue = report.overdue,
            alerts_sent = report.alerts_sent,
            "Watchdog sweep finished"
        );
        Ok(report)
    }

    /// An overdue alert fires only when no overdue alert for the job
    /// exists within the cooldown window.
    async fn should_alert_overdue(
        &self,
        job_name: &str,
        now: leadbridge_core::types::Timestamp,
    ) -> Result<bool, SyncError> {
        let latest = self
            .store
            .latest_alert(job_name, alert_type::OVERDUE)
            .await?;
        Ok(match latest {
            Some(alert) => now - alert.created_at > self.cooldown,
            None => true,
        })
    }

    /// A recovered alert fires only when the job was previously
    /// alerted overdue, has not already been alerted recovered since,
    /// and the cooldown has passed since the last recovered alert.
    async fn should_alert_recovered(
        &self,
        job_name: &str,
        now: leadbridge_core::types::Timestamp,
    ) -> Result<bool, SyncError> {
        let Some(overdue) = self
            .store
            .latest_alert(job_name, alert_type::OVERDUE)
            .await?
        else {
            return Ok(false);
        };
        let recovered = self
            .store
            .latest_alert(job_name, alert_type::RECOVERED)
            .await?;
        Ok(match recovered {
            Some(recovered) => {
                recovered.created_at < overdue.created_at
                    && now - recovered.created_at > self.cooldown
            }
            None => true,
        })
    }

    /// Persist the alert, then deliver it best-effort.
    async fn emit(&self, job_name: &str, kind: &str, message: &str) -> Result<(), SyncError> {
        self.store.insert_alert(job_name, kind, message).await?;
        tracing::warn!(job = job_name, kind, %message, "Watchdog alert");
        if let Err(e) = self.sink.send(message).await {
            tracing::error!(job = job_name, error = %e, "Failed to deliver watchdog alert");
        }
        Ok(())
    }
}
