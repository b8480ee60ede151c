use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::dto::test_dto::{SubmitTestPayload, VisibleTestsQuery};
use crate::error::Result;
use crate::middleware::auth::AuthSession;
use crate::utils::time::now;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_tests(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<VisibleTestsQuery>,
) -> Result<impl IntoResponse> {
    let tests = state.test_service.visible_tests(&session, &query, now()).await?;
    Ok(Json(tests))
}

#[axum::debug_handler]
pub async fn enter_test(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let entry = state.test_service.entry(&session, &id, now()).await?;
    Ok(Json(entry))
}

#[axum::debug_handler]
pub async fn submit_test(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(payload): Json<SubmitTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let result = state.test_service.submit(&session, &id, &payload, now()).await?;
    Ok(Json(result))
}
