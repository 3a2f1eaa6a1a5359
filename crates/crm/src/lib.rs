//! Typed HTTP client for the CRM.
//!
//! Organization/person lookup and creation, pipeline-status custom
//! field updates (with enum-option mapping), and note attachment. The
//! [`CrmApi`] trait is the seam the sync engine is tested through.

pub mod client;
pub mod fields;
pub mod types;

pub use client::{CrmClient, CrmError};
pub use fields::StatusFieldMap;
pub use types::{Organization, Person};

use async_trait::async_trait;
use leadbridge_core::pipeline::PipelineStatus;
use leadbridge_core::types::DbId;

/// CRM operations consumed by the sync engine.
///
/// Lookups are by natural key (organization name, person email) so the
/// engine can upsert instead of blind-creating; see the idempotency
/// guarantee on the engine.
#[async_trait]
pub trait CrmApi: Send + Sync {
    async fn find_org_by_name(&self, name: &str) -> Result<Option<Organization>, CrmError>;

    async fn create_org(&self, name: &str) -> Result<Organization, CrmError>;

    async fn find_person_by_email(&self, email: &str) -> Result<Option<Person>, CrmError>;

    async fn create_person(
        &self,
        name: &str,
        email: &str,
        org_id: DbId,
        status: PipelineStatus,
    ) -> Result<Person, CrmError>;

    /// Set the person's pipeline-status custom field.
    async fn update_person_status(
        &self,
        person_id: DbId,
        status: PipelineStatus,
    ) -> Result<(), CrmError>;

    /// Attach a note to a person (and optionally its organization).
    async fn add_note(
        &self,
        content: &str,
        person_id: DbId,
        org_id: Option<DbId>,
    ) -> Result<(), CrmError>;
}
