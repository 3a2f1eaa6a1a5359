//! Background tasks spawned by the binary entrypoint.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use leadbridge_sync::watchdog::CronWatchdog;

/// How often the scheduled watchdog sweep runs.
const WATCHDOG_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Spawn the periodic watchdog sweep.
///
/// The first tick fires immediately so a freshly restarted server
/// re-evaluates job health without waiting a full interval.
pub fn start_watchdog_scheduler(
    watchdog: Arc<CronWatchdog>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(WATCHDOG_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match watchdog.run().await {
                        Ok(report) => {
                            tracing::debug!(
                                overdue = report.overdue,
                                alerts_sent = report.alerts_sent,
                                "Scheduled watchdog sweep finished"
                            );
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Scheduled watchdog sweep failed");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!("Watchdog scheduler stopping");
                    return;
                }
            }
        }
    })
}
