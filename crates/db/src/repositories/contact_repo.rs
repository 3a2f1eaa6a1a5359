//! Repository for the `contacts` table.
//!
//! The sync service only reads contacts; writes happen in the
//! scraping/enrichment side of the platform.

use sqlx::PgPool;

use crate::models::contact::Contact;

const CONTACT_COLUMNS: &str = "\
    id, email, full_name, company_name, crm_org_id, crm_person_id, \
    outreach_removed_at, created_at, updated_at";

/// Read-side access to local contact records.
pub struct ContactRepo;

impl ContactRepo {
    /// Find a contact by email (case-insensitive).
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Contact>, sqlx::Error> {
        let query = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, Contact>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }
}
