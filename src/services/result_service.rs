use serde_json::{json, Value as JsonValue};
use validator::Validate;

use crate::dto::test_dto::ScoreCorrectionPayload;
use crate::error::Result;
use crate::middleware::auth::AuthSession;
use crate::models::result::TestResult;
use crate::services::upstream_service::{Resource, UpstreamService};
use crate::services::validation;

#[derive(Clone)]
pub struct ResultService {
    upstream: UpstreamService,
}

impl ResultService {
    pub fn new(upstream: UpstreamService) -> Self {
        Self { upstream }
    }

    /// Admin score correction, bounded by the test's total marks when known.
    pub async fn correct_score(
        &self,
        session: &AuthSession,
        id: &str,
        payload: &ScoreCorrectionPayload,
    ) -> Result<JsonValue> {
        payload.validate()?;

        let result: TestResult = self.upstream.get(session, Resource::Results, id).await?;
        let total = match result.total_marks {
            Some(total) => Some(total),
            None => self.upstream.get_test(session, &result.test).await?.total_marks,
        };
        validation::validate_score_correction(payload.score, total)?;

        tracing::info!(
            result_id = %id,
            student = %result.student,
            from = ?result.score,
            to = payload.score,
            by = %session.user_id,
            "Correcting score"
        );

        let mut body = json!({ "score": payload.score });
        if let Some(reason) = payload.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            body["reason"] = json!(reason);
        }
        self.upstream
            .update(session, Resource::Results, id, &body)
            .await
    }
}
