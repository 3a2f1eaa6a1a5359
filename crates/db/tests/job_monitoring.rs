//! Integration tests for scheduled-job logs and watchdog alerts.

use sqlx::PgPool;

use leadbridge_db::models::cron::{alert_type, job_status};
use leadbridge_db::repositories::cron_job_log_repo::CronJobLogRepo;
use leadbridge_db::repositories::watchdog_alert_repo::WatchdogAlertRepo;

// ---------------------------------------------------------------------------
// Cron job logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn latest_run_wins_per_job(pool: PgPool) {
    CronJobLogRepo::insert(
        &pool,
        "lead-scrape",
        "/jobs/lead-scrape",
        job_status::ERROR,
        Some(1_200),
        Some("upstream 502"),
    )
    .await
    .unwrap();
    CronJobLogRepo::insert(
        &pool,
        "lead-scrape",
        "/jobs/lead-scrape",
        job_status::SUCCESS,
        Some(900),
        None,
    )
    .await
    .unwrap();
    CronJobLogRepo::insert(
        &pool,
        "sync-retry",
        "/jobs/sync-retry",
        job_status::SUCCESS,
        Some(40),
        None,
    )
    .await
    .unwrap();

    let latest = CronJobLogRepo::find_latest_for_job(&pool, "lead-scrape")
        .await
        .unwrap()
        .expect("job has runs");
    assert_eq!(latest.status, job_status::SUCCESS);
    assert_eq!(latest.duration_ms, Some(900));
}

#[sqlx::test(migrations = "./migrations")]
async fn job_with_no_runs_yields_none(pool: PgPool) {
    let latest = CronJobLogRepo::find_latest_for_job(&pool, "never-ran")
        .await
        .unwrap();
    assert!(latest.is_none());
}

// ---------------------------------------------------------------------------
// Watchdog alerts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn find_latest_filters_by_alert_type(pool: PgPool) {
    WatchdogAlertRepo::insert(&pool, "lead-scrape", alert_type::OVERDUE, "overdue by 2h")
        .await
        .unwrap();
    WatchdogAlertRepo::insert(&pool, "lead-scrape", alert_type::RECOVERED, "back to normal")
        .await
        .unwrap();

    let overdue = WatchdogAlertRepo::find_latest(&pool, "lead-scrape", alert_type::OVERDUE)
        .await
        .unwrap()
        .expect("overdue alert exists");
    assert_eq!(overdue.message, "overdue by 2h");

    let any = WatchdogAlertRepo::find_latest_any(&pool, "lead-scrape")
        .await
        .unwrap()
        .expect("alerts exist");
    assert_eq!(any.alert_type, alert_type::RECOVERED);
}

#[sqlx::test(migrations = "./migrations")]
async fn alerts_are_scoped_to_their_job(pool: PgPool) {
    WatchdogAlertRepo::insert(&pool, "lead-scrape", alert_type::OVERDUE, "overdue")
        .await
        .unwrap();

    let other = WatchdogAlertRepo::find_latest(&pool, "sync-retry", alert_type::OVERDUE)
        .await
        .unwrap();
    assert!(other.is_none());
}
