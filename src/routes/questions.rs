use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::middleware::auth::AuthSession;
use crate::models::question::Question;
use crate::routes::resources;
use crate::services::upstream_service::Resource;
use crate::services::validation;
use crate::AppState;

pub async fn list_questions(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    resources::list(Resource::Questions, state, session, query).await
}

pub async fn get_question(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    resources::get_one(Resource::Questions, state, session, id).await
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    session: AuthSession,
    Json(question): Json<Question>,
) -> Result<impl IntoResponse> {
    validation::validate_question(&question)?;
    let created = state
        .upstream
        .create(&session, Resource::Questions, &question)
        .await?;
    tracing::info!(
        by = %session.user_id,
        subject = %question.subject,
        bank = question.save_to_bank,
        "Created question"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    Json(question): Json<Question>,
) -> Result<impl IntoResponse> {
    validation::validate_question(&question)?;
    let updated: JsonValue = state
        .upstream
        .update(&session, Resource::Questions, &id, &question)
        .await?;
    Ok(Json(updated))
}

pub async fn delete_question(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    resources::delete(Resource::Questions, state, session, id).await
}
