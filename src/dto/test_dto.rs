use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::test::{Test, TestStatus};
use crate::services::availability::Availability;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct VisibleTestsQuery {
    pub subject: Option<String>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTestView {
    pub id: String,
    pub title: String,
    pub subject: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub duration: Option<u32>,
    pub batch: Option<String>,
    pub availability: Availability,
    pub can_start: bool,
    pub seconds_remaining: Option<i64>,
}

impl StudentTestView {
    pub fn new(
        test: &Test,
        batch: Option<String>,
        availability: Availability,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: test.id.clone(),
            title: test.title.clone(),
            subject: test.subject.clone(),
            class_name: test.class_name.clone(),
            duration: test.duration,
            batch,
            availability,
            can_start: availability.is_open(),
            seconds_remaining: availability.seconds_remaining(now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TestEntryResponse {
    pub view: StudentTestView,
    pub test: Test,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangePayload {
    pub status: TestStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question: String,
    pub selected: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitTestPayload {
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ScoreCorrectionPayload {
    #[validate(range(min = 0.0, message = "Score cannot be negative"))]
    pub score: f64,
    pub reason: Option<String>,
}

/// Body forwarded to `POST /tests/:id/submit`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub student: String,
    pub batch: String,
    pub score: f64,
    pub total_marks: f64,
    pub answers: Vec<crate::models::result::AnswerRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ungraded: Vec<String>,
    pub submitted_at: DateTime<Utc>,
}
