//! Pass-through CRUD for the school API collections. Writes to `/users` are
//! checked against the user rules first.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::middleware::auth::AuthSession;
use crate::models::user::User;
use crate::services::upstream_service::Resource;
use crate::services::validation;
use crate::AppState;

pub async fn list(
    resource: Resource,
    state: AppState,
    session: AuthSession,
    query: HashMap<String, String>,
) -> Result<Json<JsonValue>> {
    let query: Vec<(String, String)> = query.into_iter().collect();
    let items = state.upstream.list(&session, resource, &query).await?;
    Ok(Json(items))
}

pub async fn get_one(
    resource: Resource,
    state: AppState,
    session: AuthSession,
    id: String,
) -> Result<Json<JsonValue>> {
    let item: JsonValue = state.upstream.get(&session, resource, &id).await?;
    Ok(Json(item))
}

pub async fn create(
    resource: Resource,
    state: AppState,
    session: AuthSession,
    body: JsonValue,
) -> Result<(StatusCode, Json<JsonValue>)> {
    check_write(resource, &session, &body)?;
    let created = state.upstream.create(&session, resource, &body).await?;
    tracing::info!(resource = resource.path(), by = %session.user_id, "Created record");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    resource: Resource,
    state: AppState,
    session: AuthSession,
    id: String,
    body: JsonValue,
) -> Result<Json<JsonValue>> {
    check_write(resource, &session, &body)?;
    let updated = state.upstream.update(&session, resource, &id, &body).await?;
    Ok(Json(updated))
}

pub async fn delete(
    resource: Resource,
    state: AppState,
    session: AuthSession,
    id: String,
) -> Result<StatusCode> {
    state.upstream.delete(&session, resource, &id).await?;
    tracing::info!(resource = resource.path(), %id, by = %session.user_id, "Deleted record");
    Ok(StatusCode::NO_CONTENT)
}

fn check_write(resource: Resource, session: &AuthSession, body: &JsonValue) -> Result<()> {
    if resource == Resource::Users {
        let user: User = serde_json::from_value(body.clone())?;
        validation::validate_user(&user, session.role)?;
    }
    Ok(())
}

/// `GET/POST /api/<resource>` and `GET/PUT/DELETE /api/<resource>/:id`.
pub fn resource_router(resource: Resource) -> Router<AppState> {
    let collection = format!("/api/{}", resource.path());
    let item = format!("/api/{}/:id", resource.path());

    Router::new()
        .route(
            &collection,
            get(
                move |State(state): State<AppState>,
                      session: AuthSession,
                      Query(query): Query<HashMap<String, String>>| {
                    list(resource, state, session, query)
                },
            )
            .post(
                move |State(state): State<AppState>,
                      session: AuthSession,
                      Json(body): Json<JsonValue>| { create(resource, state, session, body) },
            ),
        )
        .route(
            &item,
            get(
                move |State(state): State<AppState>, session: AuthSession, Path(id): Path<String>| {
                    get_one(resource, state, session, id)
                },
            )
            .put(
                move |State(state): State<AppState>,
                      session: AuthSession,
                      Path(id): Path<String>,
                      Json(body): Json<JsonValue>| { update(resource, state, session, id, body) },
            )
            .delete(
                move |State(state): State<AppState>, session: AuthSession, Path(id): Path<String>| {
                    delete(resource, state, session, id)
                },
            ),
        )
}
