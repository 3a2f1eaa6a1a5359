//! Repository for the `cron_job_logs` table.

use sqlx::PgPool;

use crate::models::cron::CronJobLogEntry;

const CRON_LOG_COLUMNS: &str = "\
    id, job_name, job_path, status, duration_ms, started_at, \
    completed_at, response_summary, created_at";

/// Read/write access to scheduled-job run logs.
pub struct CronJobLogRepo;

impl CronJobLogRepo {
    /// Record one execution of a scheduled job.
    pub async fn insert(
        pool: &PgPool,
        job_name: &str,
        job_path: &str,
        status: &str,
        duration_ms: Option<i64>,
        response_summary: Option<&str>,
    ) -> Result<CronJobLogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO cron_job_logs \
                 (job_name, job_path, status, duration_ms, started_at, completed_at, response_summary) \
             VALUES ($1, $2, $3, $4, NOW(), NOW(), $5) \
             RETURNING {CRON_LOG_COLUMNS}"
        );
        sqlx::query_as::<_, CronJobLogEntry>(&query)
            .bind(job_name)
            .bind(job_path)
            .bind(status)
            .bind(duration_ms)
            .bind(response_summary)
            .fetch_one(pool)
            .await
    }

    /// Find the most recent run of a job, if any.
    pub async fn find_latest_for_job(
        pool: &PgPool,
        job_name: &str,
    ) -> Result<Option<CronJobLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {CRON_LOG_COLUMNS} FROM cron_job_logs \
             WHERE job_name = $1 ORDER BY started_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, CronJobLogEntry>(&query)
            .bind(job_name)
            .fetch_optional(pool)
            .await
    }
}
