//! Repository for the `backfill_batches` and `backfill_leads` tables.

use sqlx::PgPool;

use leadbridge_core::types::DbId;

use crate::models::backfill::{batch_status, BackfillBatch, BackfillLead};

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

const BATCH_COLUMNS: &str = "\
    id, status, dry_run, total_leads, synced_count, skipped_count, \
    failed_count, current_campaign_index, current_campaign_name, \
    campaign_count, started_at, completed_at, last_error, created_at, \
    updated_at";

const LEAD_COLUMNS: &str = "\
    id, batch_id, lead_email, campaign_id, campaign_name, event_type, \
    status, crm_org_id, crm_person_id, error_message, collected_at, \
    completed_at";

/// Provides operations on backfill batches and their lead rows.
pub struct BackfillRepo;

impl BackfillRepo {
    // -----------------------------------------------------------------------
    // Batches
    // -----------------------------------------------------------------------

    /// Create a new batch in `pending` state.
    pub async fn create_batch(pool: &PgPool, dry_run: bool) -> Result<BackfillBatch, sqlx::Error> {
        let query = format!(
            "INSERT INTO backfill_batches (status, dry_run, started_at) \
             VALUES ('pending', $1, NOW()) \
             RETURNING {BATCH_COLUMNS}"
        );
        sqlx::query_as::<_, BackfillBatch>(&query)
            .bind(dry_run)
            .fetch_one(pool)
            .await
    }

    /// Find a batch by ID.
    pub async fn find_batch(pool: &PgPool, id: DbId) -> Result<Option<BackfillBatch>, sqlx::Error> {
        let query = format!("SELECT {BATCH_COLUMNS} FROM backfill_batches WHERE id = $1");
        sqlx::query_as::<_, BackfillBatch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the most recent batch still in a resumable state
    /// (`collecting`, `processing`, or `paused`).
    pub async fn find_active_batch(pool: &PgPool) -> Result<Option<BackfillBatch>, sqlx::Error> {
        let query = format!(
            "SELECT {BATCH_COLUMNS} FROM backfill_batches \
             WHERE status IN ('pending', 'collecting', 'processing', 'paused') \
             ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, BackfillBatch>(&query)
            .fetch_optional(pool)
            .await
    }

    /// Move a batch to a new status. Returns the updated row.
    pub async fn set_batch_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<BackfillBatch>, sqlx::Error> {
        let query = format!(
            "UPDATE backfill_batches SET \
                 status = $2, \
                 completed_at = CASE WHEN $2 IN ('completed', 'failed', 'cancelled') \
                                     THEN NOW() ELSE completed_at END, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {BATCH_COLUMNS}"
        );
        sqlx::query_as::<_, BackfillBatch>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Record collection progress: which campaign the collector is on
    /// and how many campaigns the batch covers.
    pub async fn set_collection_progress(
        pool: &PgPool,
        id: DbId,
        campaign_index: i32,
        campaign_name: &str,
        campaign_count: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE backfill_batches SET \
                 current_campaign_index = $2, \
                 current_campaign_name = $3, \
                 campaign_count = $4, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(campaign_index)
        .bind(campaign_name)
        .bind(campaign_count)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Set the total lead count after collection completes.
    pub async fn set_total_leads(pool: &PgPool, id: DbId, total: i32) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE backfill_batches SET total_leads = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(total)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Increment one of the batch counters (`synced_count`,
    /// `skipped_count`, or `failed_count`) based on a lead outcome.
    pub async fn increment_counter(
        pool: &PgPool,
        id: DbId,
        lead_status: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE backfill_batches SET \
                 synced_count  = synced_count  + CASE WHEN $2 = 'synced'  THEN 1 ELSE 0 END, \
                 skipped_count = skipped_count + CASE WHEN $2 = 'skipped' THEN 1 ELSE 0 END, \
                 failed_count  = failed_count  + CASE WHEN $2 = 'failed'  THEN 1 ELSE 0 END, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(lead_status)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a batch-level error and move the batch to `failed`.
    pub async fn mark_batch_failed(
        pool: &PgPool,
        id: DbId,
        error: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE backfill_batches SET \
                 status = $2, last_error = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(batch_status::FAILED)
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Leads
    // -----------------------------------------------------------------------

    /// Insert a discovered lead in `pending` state. Duplicate
    /// (batch, campaign, email) tuples are ignored so re-collection
    /// after an interrupted run cannot double up.
    pub async fn insert_lead(
        pool: &PgPool,
        batch_id: DbId,
        lead_email: &str,
        campaign_id: &str,
        campaign_name: Option<&str>,
        event_type: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO backfill_leads \
                 (batch_id, lead_email, campaign_id, campaign_name, event_type, status) \
             VALUES ($1, $2, $3, $4, $5, 'pending') \
             ON CONFLICT (batch_id, campaign_id, lead_email) DO NOTHING",
        )
        .bind(batch_id)
        .bind(lead_email)
        .bind(campaign_id)
        .bind(campaign_name)
        .bind(event_type)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List pending leads for a batch, oldest first.
    pub async fn list_pending_leads(
        pool: &PgPool,
        batch_id: DbId,
        limit: i64,
    ) -> Result<Vec<BackfillLead>, sqlx::Error> {
        let query = format!(
            "SELECT {LEAD_COLUMNS} FROM backfill_leads \
             WHERE batch_id = $1 AND status = 'pending' \
             ORDER BY collected_at ASC, id ASC LIMIT $2"
        );
        sqlx::query_as::<_, BackfillLead>(&query)
            .bind(batch_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Count leads for a batch still in `pending` state.
    pub async fn count_pending_leads(pool: &PgPool, batch_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM backfill_leads WHERE batch_id = $1 AND status = 'pending'")
            .bind(batch_id)
            .fetch_one(pool)
            .await
    }

    /// Count all leads collected for a batch.
    pub async fn count_leads(pool: &PgPool, batch_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM backfill_leads WHERE batch_id = $1")
            .bind(batch_id)
            .fetch_one(pool)
            .await
    }

    /// Update a lead's terminal status and CRM ids.
    pub async fn mark_lead(
        pool: &PgPool,
        lead_id: DbId,
        status: &str,
        crm_org_id: Option<DbId>,
        crm_person_id: Option<DbId>,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE backfill_leads SET \
                 status = $2, \
                 crm_org_id = $3, \
                 crm_person_id = $4, \
                 error_message = $5, \
                 completed_at = CASE WHEN $2 IN ('synced', 'skipped', 'failed') \
                                     THEN NOW() ELSE completed_at END \
             WHERE id = $1",
        )
        .bind(lead_id)
        .bind(status)
        .bind(crm_org_id)
        .bind(crm_person_id)
        .bind(error_message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Whether this lead was already synced by any prior batch. Makes
    /// re-collection cheap: known-synced leads are skipped without an
    /// engine call.
    pub async fn was_lead_synced(
        pool: &PgPool,
        campaign_id: &str,
        lead_email: &str,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM backfill_leads \
             WHERE campaign_id = $1 AND lead_email = $2 AND status = 'synced'",
        )
        .bind(campaign_id)
        .bind(lead_email)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}
