use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::dto::schedule_dto::{SchedulePayload, ScheduleResponse, UpstreamSchedule};
use crate::dto::test_dto::{
    StudentTestView, SubmissionRecord, SubmitTestPayload, TestEntryResponse, VisibleTestsQuery,
};
use crate::error::{Error, Result};
use crate::middleware::auth::AuthSession;
use crate::models::question::Question;
use crate::models::test::{Test, TestStatus};
use crate::models::user::{Capability, Role};
use crate::services::availability::{self, Availability};
use crate::services::grading_service::GradingService;
use crate::services::upstream_service::{StatusUpdate, UpstreamService};
use crate::services::validation;

/// Fields that only move through their dedicated endpoints.
const PROTECTED_FIELDS: [&str; 3] = ["status", "batches", "schedule"];

#[derive(Clone)]
pub struct TestService {
    upstream: UpstreamService,
    max_batch_size: Option<usize>,
}

impl TestService {
    pub fn new(upstream: UpstreamService, max_batch_size: Option<usize>) -> Self {
        Self {
            upstream,
            max_batch_size,
        }
    }

    pub async fn visible_tests(
        &self,
        session: &AuthSession,
        query: &VisibleTestsQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<StudentTestView>> {
        let tests = self.upstream.list_tests(session).await?;
        let visible = availability::filter_visible_tests(
            &tests,
            &session.user_id,
            query.subject.as_deref(),
            query.class_name.as_deref(),
        );
        tracing::info!(
            student = %session.user_id,
            fetched = tests.len(),
            visible = visible.len(),
            "Listed tests for student"
        );

        Ok(visible
            .into_iter()
            .map(|test| student_view(test, &session.user_id, now))
            .collect())
    }

    /// Gate for entering a test. Returns the redacted test when the
    /// student's window is open, a coded 403 otherwise.
    pub async fn entry(
        &self,
        session: &AuthSession,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<TestEntryResponse> {
        let test = self.upstream.get_test(session, id).await?;
        let view = gate(&test, &session.user_id, now)?;
        Ok(TestEntryResponse {
            view,
            test: test.redacted(),
        })
    }

    pub async fn submit(
        &self,
        session: &AuthSession,
        id: &str,
        payload: &SubmitTestPayload,
        now: DateTime<Utc>,
    ) -> Result<JsonValue> {
        let test = self.upstream.get_test(session, id).await?;
        let view = gate(&test, &session.user_id, now)?;

        let graded = GradingService::grade(&test, &payload.answers);
        let record = SubmissionRecord {
            student: session.user_id.clone(),
            batch: view.batch.unwrap_or_default(),
            score: graded.score,
            total_marks: test.total_marks.unwrap_or(graded.max_score),
            answers: graded.answers,
            ungraded: graded.ungraded,
            submitted_at: now,
        };
        tracing::info!(
            test_id = %test.id,
            student = %session.user_id,
            score = record.score,
            total = record.total_marks,
            "Submitting test"
        );
        self.upstream.submit_test(session, id, &record).await
    }

    pub async fn schedule(
        &self,
        session: &AuthSession,
        id: &str,
        payload: &SchedulePayload,
    ) -> Result<ScheduleResponse> {
        let validated = validation::validate_schedule(payload, self.max_batch_size)?;

        let test = self.upstream.get_test(session, id).await?;
        if matches!(test.status, TestStatus::Active | TestStatus::Completed) {
            return Err(Error::BadRequest(format!(
                "the schedule of a {} test cannot change",
                test.status
            )));
        }
        if test.status == TestStatus::Draft {
            return Err(Error::BadRequest(
                "a test must be approved before it is scheduled".to_string(),
            ));
        }

        for warning in &validated.warnings {
            tracing::warn!(test_id = %id, "{}", warning);
        }
        tracing::info!(
            test_id = %id,
            batches = validated.batches.len(),
            by = %session.user_id,
            "Updating test schedule"
        );

        let updated = self
            .upstream
            .schedule_test(
                session,
                id,
                &UpstreamSchedule {
                    batches: validated.batches,
                },
            )
            .await?;

        Ok(ScheduleResponse {
            status: "success",
            test: updated,
            warnings: validated.warnings,
        })
    }

    pub async fn change_status(
        &self,
        session: &AuthSession,
        id: &str,
        target: TestStatus,
    ) -> Result<JsonValue> {
        let test = self.upstream.get_test(session, id).await?;
        validation::validate_transition(&test, target, session.role)?;
        tracing::info!(
            test_id = %id,
            from = %test.status,
            to = %target,
            by = %session.user_id,
            "Changing test status"
        );
        self.upstream
            .update_test(session, id, &StatusUpdate { status: target })
            .await
    }

    pub async fn update(
        &self,
        session: &AuthSession,
        id: &str,
        body: JsonValue,
    ) -> Result<JsonValue> {
        let JsonValue::Object(fields) = &body else {
            return Err(Error::BadRequest("expected a JSON object".to_string()));
        };
        if let Some(field) = PROTECTED_FIELDS.iter().find(|f| fields.contains_key(**f)) {
            return Err(Error::BadRequest(format!(
                "'{}' cannot be changed here; use the status or schedule endpoint",
                field
            )));
        }
        if let Some(JsonValue::Array(questions)) = fields.get("questions") {
            for question in questions.iter().filter(|q| q.is_object()) {
                let question: Question = serde_json::from_value(question.clone())?;
                validation::validate_question(&question)?;
            }
        }

        let test = self.upstream.get_test(session, id).await?;
        self.ensure_owner(session, &test)?;
        validation::validate_edit(&test, session.role)?;

        self.upstream.update_test(session, id, &body).await
    }

    pub async fn delete(&self, session: &AuthSession, id: &str) -> Result<()> {
        if !session.can(Capability::DeleteTests) {
            return Err(Error::forbidden("forbidden", "only administrators can delete tests"));
        }
        tracing::info!(test_id = %id, by = %session.user_id, "Deleting test and its results");
        self.upstream.delete_test(session, id).await?;
        Ok(())
    }

    pub async fn get(&self, session: &AuthSession, id: &str) -> Result<Test> {
        let test = self.upstream.get_test(session, id).await?;
        self.ensure_owner(session, &test)?;
        Ok(test)
    }

    pub async fn list(
        &self,
        session: &AuthSession,
        query: &[(String, String)],
    ) -> Result<JsonValue> {
        self.upstream.list_tests_raw(session, query).await
    }

    fn ensure_owner(&self, session: &AuthSession, test: &Test) -> Result<()> {
        match (&session.role, test.created_by.as_deref()) {
            (Role::Teacher, Some(owner)) if owner != session.user_id => Err(Error::forbidden(
                "forbidden",
                "teachers can only access their own tests",
            )),
            _ => Ok(()),
        }
    }
}

fn student_view(test: &Test, student_id: &str, now: DateTime<Utc>) -> StudentTestView {
    let batch = availability::find_student_batch(test, student_id).map(|b| b.name.clone());
    StudentTestView::new(test, batch, availability::evaluate(test, student_id, now), now)
}

fn gate(test: &Test, student_id: &str, now: DateTime<Utc>) -> Result<StudentTestView> {
    if !matches!(test.status, TestStatus::Scheduled | TestStatus::Active) {
        return Err(Error::forbidden("not_scheduled", "This test has not been scheduled"));
    }
    let view = student_view(test, student_id, now);
    match view.availability {
        Availability::Open { .. } => Ok(view),
        other => Err(Error::forbidden(other.code(), other.message())),
    }
}
