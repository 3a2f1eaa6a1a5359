//! Repository for the `sync_logs` table.

use sqlx::PgPool;

use leadbridge_core::types::DbId;

use crate::models::sync_log::{NewSyncLog, SyncLogEntry};

// ---------------------------------------------------------------------------
// Column list
// ---------------------------------------------------------------------------

const SYNC_LOG_COLUMNS: &str = "\
    id, campaign_id, campaign_name, lead_email, event_type, outcome, \
    skip_reason, error_message, attempt_count, crm_org_id, crm_person_id, \
    org_created, person_created, post_deletion, reply_sentiment, source, \
    created_at, updated_at";

/// Provides operations on sync-log rows.
pub struct SyncLogRepo;

impl SyncLogRepo {
    /// Insert a new sync-log row with attempt count 1.
    pub async fn insert(pool: &PgPool, entry: &NewSyncLog) -> Result<SyncLogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO sync_logs \
                 (campaign_id, campaign_name, lead_email, event_type, outcome, \
                  skip_reason, error_message, crm_org_id, crm_person_id, \
                  org_created, person_created, post_deletion, reply_sentiment, source) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {SYNC_LOG_COLUMNS}"
        );
        sqlx::query_as::<_, SyncLogEntry>(&query)
            .bind(&entry.campaign_id)
            .bind(&entry.campaign_name)
            .bind(&entry.lead_email)
            .bind(&entry.event_type)
            .bind(&entry.outcome)
            .bind(&entry.skip_reason)
            .bind(&entry.error_message)
            .bind(entry.crm_org_id)
            .bind(entry.crm_person_id)
            .bind(entry.org_created)
            .bind(entry.person_created)
            .bind(entry.post_deletion)
            .bind(&entry.reply_sentiment)
            .bind(&entry.source)
            .fetch_one(pool)
            .await
    }

    /// Find the most recent row for a (campaign, lead, event) tuple.
    ///
    /// Used for upsert-style recording: idempotent event types update
    /// the existing row instead of appending history.
    pub async fn find_latest(
        pool: &PgPool,
        campaign_id: &str,
        lead_email: &str,
        event_type: &str,
    ) -> Result<Option<SyncLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs \
             WHERE campaign_id = $1 AND lead_email = $2 AND event_type = $3 \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, SyncLogEntry>(&query)
            .bind(campaign_id)
            .bind(lead_email)
            .bind(event_type)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite an existing row's outcome and CRM results, bumping the
    /// attempt count. Used both by idempotent re-delivery and retries.
    pub async fn update_result(
        pool: &PgPool,
        id: DbId,
        entry: &NewSyncLog,
    ) -> Result<Option<SyncLogEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE sync_logs SET \
                 outcome = $2, \
                 skip_reason = $3, \
                 error_message = $4, \
                 crm_org_id = COALESCE($5, crm_org_id), \
                 crm_person_id = COALESCE($6, crm_person_id), \
                 org_created = $7, \
                 person_created = $8, \
                 post_deletion = $9, \
                 reply_sentiment = COALESCE($10, reply_sentiment), \
                 attempt_count = attempt_count + 1, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {SYNC_LOG_COLUMNS}"
        );
        sqlx::query_as::<_, SyncLogEntry>(&query)
            .bind(id)
            .bind(&entry.outcome)
            .bind(&entry.skip_reason)
            .bind(&entry.error_message)
            .bind(entry.crm_org_id)
            .bind(entry.crm_person_id)
            .bind(entry.org_created)
            .bind(entry.person_created)
            .bind(entry.post_deletion)
            .bind(&entry.reply_sentiment)
            .fetch_optional(pool)
            .await
    }

    /// List all rows with outcome `error`, oldest first.
    pub async fn list_failed(pool: &PgPool) -> Result<Vec<SyncLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs \
             WHERE outcome = 'error' ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, SyncLogEntry>(&query).fetch_all(pool).await
    }

    /// List recent rows for operator visibility.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SyncLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, SyncLogEntry>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find a row by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<SyncLogEntry>, sqlx::Error> {
        let query = format!("SELECT {SYNC_LOG_COLUMNS} FROM sync_logs WHERE id = $1");
        sqlx::query_as::<_, SyncLogEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
