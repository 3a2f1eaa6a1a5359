//! Local contact record.
//!
//! Written by the scraping/enrichment side of the platform; the sync
//! engine only reads it, chiefly for the post-deletion guard
//! (`outreach_removed_at`).

use serde::Serialize;
use sqlx::FromRow;

use leadbridge_core::types::{DbId, Timestamp};

/// A row from the `contacts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Contact {
    pub id: DbId,
    pub email: String,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub crm_org_id: Option<DbId>,
    pub crm_person_id: Option<DbId>,
    /// Set when the lead was detached from the outreach platform.
    /// Non-null means "stop further automated engagement".
    pub outreach_removed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
