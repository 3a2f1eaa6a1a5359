//! Integration tests for backfill batch and lead tracking.

use sqlx::PgPool;

use leadbridge_db::models::backfill::batch_status;
use leadbridge_db::repositories::backfill_repo::BackfillRepo;

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn new_batch_starts_pending_and_is_active(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();
    assert_eq!(batch.status, batch_status::PENDING);
    assert!(!batch.dry_run);
    assert_eq!(batch.total_leads, 0);

    let active = BackfillRepo::find_active_batch(&pool)
        .await
        .unwrap()
        .expect("pending batch counts as active");
    assert_eq!(active.id, batch.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn terminal_batches_are_not_active(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();
    let updated = BackfillRepo::set_batch_status(&pool, batch.id, batch_status::COMPLETED)
        .await
        .unwrap()
        .expect("batch exists");
    assert_eq!(updated.status, batch_status::COMPLETED);
    assert!(updated.completed_at.is_some());

    let active = BackfillRepo::find_active_batch(&pool).await.unwrap();
    assert!(active.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn pausing_does_not_stamp_completion(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();
    let paused = BackfillRepo::set_batch_status(&pool, batch.id, batch_status::PAUSED)
        .await
        .unwrap()
        .unwrap();
    assert!(paused.completed_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn counters_increment_by_lead_status(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();

    BackfillRepo::increment_counter(&pool, batch.id, "synced").await.unwrap();
    BackfillRepo::increment_counter(&pool, batch.id, "synced").await.unwrap();
    BackfillRepo::increment_counter(&pool, batch.id, "skipped").await.unwrap();
    BackfillRepo::increment_counter(&pool, batch.id, "failed").await.unwrap();

    let found = BackfillRepo::find_batch(&pool, batch.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.synced_count, 2);
    assert_eq!(found.skipped_count, 1);
    assert_eq!(found.failed_count, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn mark_batch_failed_records_the_error(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();
    BackfillRepo::mark_batch_failed(&pool, batch.id, "campaign listing timed out")
        .await
        .unwrap();

    let found = BackfillRepo::find_batch(&pool, batch.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.status, batch_status::FAILED);
    assert_eq!(found.last_error.as_deref(), Some("campaign listing timed out"));
    assert!(found.completed_at.is_some());
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_lead_insert_is_a_no_op(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();

    let first = BackfillRepo::insert_lead(
        &pool,
        batch.id,
        "jane@acme.io",
        "camp-1",
        Some("Q3 Outbound"),
        "email_sent",
    )
    .await
    .unwrap();
    assert!(first);

    // Re-collection after an interrupted run hits the same tuple.
    let second = BackfillRepo::insert_lead(
        &pool,
        batch.id,
        "jane@acme.io",
        "camp-1",
        Some("Q3 Outbound"),
        "email_sent",
    )
    .await
    .unwrap();
    assert!(!second);

    assert_eq!(BackfillRepo::count_leads(&pool, batch.id).await.unwrap(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn pending_leads_come_back_in_collection_order(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();
    for email in ["a@acme.io", "b@acme.io", "c@acme.io"] {
        BackfillRepo::insert_lead(&pool, batch.id, email, "camp-1", None, "email_sent")
            .await
            .unwrap();
    }

    let page = BackfillRepo::list_pending_leads(&pool, batch.id, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].lead_email, "a@acme.io");
    assert_eq!(page[1].lead_email, "b@acme.io");

    assert_eq!(
        BackfillRepo::count_pending_leads(&pool, batch.id).await.unwrap(),
        3
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn marking_a_lead_clears_it_from_pending(pool: PgPool) {
    let batch = BackfillRepo::create_batch(&pool, false).await.unwrap();
    BackfillRepo::insert_lead(&pool, batch.id, "jane@acme.io", "camp-1", None, "email_sent")
        .await
        .unwrap();
    let lead = &BackfillRepo::list_pending_leads(&pool, batch.id, 10).await.unwrap()[0];

    BackfillRepo::mark_lead(&pool, lead.id, "synced", Some(11), Some(22), None)
        .await
        .unwrap();

    assert_eq!(
        BackfillRepo::count_pending_leads(&pool, batch.id).await.unwrap(),
        0
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn was_lead_synced_looks_across_batches(pool: PgPool) {
    let first = BackfillRepo::create_batch(&pool, false).await.unwrap();
    BackfillRepo::insert_lead(&pool, first.id, "jane@acme.io", "camp-1", None, "email_sent")
        .await
        .unwrap();
    let lead = &BackfillRepo::list_pending_leads(&pool, first.id, 10).await.unwrap()[0];
    BackfillRepo::mark_lead(&pool, lead.id, "synced", Some(11), Some(22), None)
        .await
        .unwrap();
    BackfillRepo::set_batch_status(&pool, first.id, batch_status::COMPLETED)
        .await
        .unwrap();

    assert!(BackfillRepo::was_lead_synced(&pool, "camp-1", "jane@acme.io")
        .await
        .unwrap());
    // Failed or pending leads do not count as synced.
    assert!(!BackfillRepo::was_lead_synced(&pool, "camp-1", "other@acme.io")
        .await
        .unwrap());
    // Same lead in a different campaign is a different sync.
    assert!(!BackfillRepo::was_lead_synced(&pool, "camp-2", "jane@acme.io")
        .await
        .unwrap());
}
