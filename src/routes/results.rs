use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::dto::test_dto::ScoreCorrectionPayload;
use crate::error::Result;
use crate::middleware::auth::AuthSession;
use crate::routes::resources;
use crate::services::upstream_service::Resource;
use crate::AppState;

pub async fn list_results(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    resources::list(Resource::Results, state, session, query).await
}

pub async fn get_result(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    resources::get_one(Resource::Results, state, session, id).await
}

#[axum::debug_handler]
pub async fn correct_score(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(payload): Json<ScoreCorrectionPayload>,
) -> Result<impl IntoResponse> {
    let result = state
        .result_service
        .correct_score(&session, &id, &payload)
        .await?;
    Ok(Json(json!({
        "status": "success",
        "result": result,
    })))
}
