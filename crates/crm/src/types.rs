//! Wire types for the CRM API.

use serde::{Deserialize, Serialize};

use leadbridge_core::types::DbId;

/// A CRM organization record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: DbId,
    pub name: String,
}

/// A CRM person record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: DbId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub org_id: Option<DbId>,
    /// Current pipeline status in wire form, when the custom field is
    /// set. Raw string so unknown option values survive a round trip.
    #[serde(default)]
    pub status: Option<String>,
}
