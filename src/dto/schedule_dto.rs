use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::test::Batch;

/// Body of `PUT /api/tests/:id/schedule`. Timestamps stay as raw strings
/// until validation so a bad value is reported instead of rejected by serde.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchedulePayload {
    #[validate(nested)]
    pub batches: Vec<BatchPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BatchPayload {
    #[validate(length(min = 1, message = "Batch name cannot be empty"))]
    pub name: String,
    #[serde(default)]
    pub students: Vec<String>,
    pub schedule: WindowPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowPayload {
    pub start: String,
    pub end: String,
}

/// What gets forwarded upstream once a schedule passes validation.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamSchedule {
    pub batches: Vec<Batch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleResponse {
    pub status: &'static str,
    pub test: serde_json::Value,
    pub warnings: Vec<String>,
}
