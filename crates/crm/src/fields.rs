//! Pipeline-status custom-field enum mapping.
//!
//! The CRM stores the pipeline status as a single-option custom field;
//! the API wants the numeric option id, not the label. This map owns
//! the field key and the status -> option-id translation so no other
//! module hardcodes CRM option ids.

use leadbridge_core::pipeline::PipelineStatus;

/// Maps [`PipelineStatus`] values onto CRM custom-field option ids.
#[derive(Debug, Clone)]
pub struct StatusFieldMap {
    field_key: String,
    options: Vec<(PipelineStatus, i64)>,
}

impl StatusFieldMap {
    /// Build a map from an explicit option table.
    pub fn new(field_key: impl Into<String>, options: Vec<(PipelineStatus, i64)>) -> Self {
        Self {
            field_key: field_key.into(),
            options,
        }
    }

    /// The custom-field key on the person record.
    pub fn field_key(&self) -> &str {
        &self.field_key
    }

    /// Option id for a status, if the CRM field defines one.
    pub fn option_id(&self, status: PipelineStatus) -> Option<i64> {
        self.options
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, id)| *id)
    }
}

impl Default for StatusFieldMap {
    /// Option ids matching the production CRM field seed order.
    fn default() -> Self {
        Self::new(
            "lead_pipeline_status",
            vec![
                (PipelineStatus::New, 1),
                (PipelineStatus::Contacted, 2),
                (PipelineStatus::Bounced, 3),
                (PipelineStatus::Unsubscribed, 4),
                (PipelineStatus::Replied, 5),
                (PipelineStatus::NotInterested, 6),
                (PipelineStatus::Interested, 7),
                (PipelineStatus::MeetingBooked, 8),
                (PipelineStatus::MeetingCompleted, 9),
                (PipelineStatus::Closed, 10),
            ],
        )
    }
}
