//! Repository for the `watchdog_alerts` table.

use sqlx::PgPool;

use crate::models::cron::WatchdogAlert;

const ALERT_COLUMNS: &str = "id, job_name, alert_type, message, created_at";

/// Read/write access to watchdog alert records.
pub struct WatchdogAlertRepo;

impl WatchdogAlertRepo {
    /// Record an emitted alert.
    pub async fn insert(
        pool: &PgPool,
        job_name: &str,
        alert_type: &str,
        message: &str,
    ) -> Result<WatchdogAlert, sqlx::Error> {
        let query = format!(
            "INSERT INTO watchdog_alerts (job_name, alert_type, message) \
             VALUES ($1, $2, $3) \
             RETURNING {ALERT_COLUMNS}"
        );
        sqlx::query_as::<_, WatchdogAlert>(&query)
            .bind(job_name)
            .bind(alert_type)
            .bind(message)
            .fetch_one(pool)
            .await
    }

    /// Find the most recent alert of a given type for a job.
    pub async fn find_latest(
        pool: &PgPool,
        job_name: &str,
        alert_type: &str,
    ) -> Result<Option<WatchdogAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {ALERT_COLUMNS} FROM watchdog_alerts \
             WHERE job_name = $1 AND alert_type = $2 \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, WatchdogAlert>(&query)
            .bind(job_name)
            .bind(alert_type)
            .fetch_optional(pool)
            .await
    }

    /// Find the most recent alert of any type for a job.
    pub async fn find_latest_any(
        pool: &PgPool,
        job_name: &str,
    ) -> Result<Option<WatchdogAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {ALERT_COLUMNS} FROM watchdog_alerts \
             WHERE job_name = $1 ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, WatchdogAlert>(&query)
            .bind(job_name)
            .fetch_optional(pool)
            .await
    }
}
