//! Pure domain logic for the LeadBridge sync service.
//!
//! No I/O lives here: the sync-event taxonomy, CRM pipeline status
//! precedence, skip reasons, and shared scalar types used by every
//! other crate in the workspace.

pub mod error;
pub mod events;
pub mod pipeline;
pub mod types;
