#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use school_portal_backend::{
    config::{Config, LogFormat},
    middleware::auth::Claims,
    models::user::Role,
    routes, AppState,
};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;
use tower::ServiceExt;
use url::Url;

pub const JWT_SECRET: &str = "test_secret_key";

/// In-memory stand-in for the school REST API.
#[derive(Default)]
pub struct MockSchoolApi {
    pub tests: Vec<JsonValue>,
    pub results: Vec<JsonValue>,
    pub submissions: Vec<JsonValue>,
    pub writes: Vec<(String, JsonValue)>,
    pub seen_tokens: Vec<String>,
}

pub type Shared = Arc<Mutex<MockSchoolApi>>;

fn record_token(db: &Shared, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);
    match token {
        Some(token) => {
            db.lock().unwrap().seen_tokens.push(token);
            Ok(())
        }
        None => Err(error(StatusCode::UNAUTHORIZED, "no token")),
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn find_test(db: &MockSchoolApi, id: &str) -> Option<usize> {
    db.tests.iter().position(|t| t["_id"] == id || t["id"] == id)
}

async fn list_tests(State(db): State<Shared>, headers: HeaderMap) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let tests = db.lock().unwrap().tests.clone();
    Json(json!({ "tests": tests, "total": tests.len() })).into_response()
}

async fn get_test(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let db = db.lock().unwrap();
    match find_test(&db, &id) {
        Some(idx) => Json(db.tests[idx].clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Test not found"),
    }
}

async fn update_test(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let mut db = db.lock().unwrap();
    db.writes.push((format!("PUT /tests/{}", id), body.clone()));
    let Some(idx) = find_test(&db, &id) else {
        return error(StatusCode::NOT_FOUND, "Test not found");
    };
    if let (Some(test), Some(fields)) = (db.tests[idx].as_object_mut(), body.as_object()) {
        for (k, v) in fields {
            test.insert(k.clone(), v.clone());
        }
    }
    Json(db.tests[idx].clone()).into_response()
}

async fn schedule_test(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let mut db = db.lock().unwrap();
    db.writes.push((format!("PUT /tests/{}/schedule", id), body.clone()));
    let Some(idx) = find_test(&db, &id) else {
        return error(StatusCode::NOT_FOUND, "Test not found");
    };
    db.tests[idx]["batches"] = body["batches"].clone();
    Json(db.tests[idx].clone()).into_response()
}

async fn submit_test(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let mut db = db.lock().unwrap();
    db.submissions.push(json!({ "test": id, "body": body }));
    let receipt = json!({ "status": "submitted", "score": body["score"] });
    (StatusCode::CREATED, Json(receipt)).into_response()
}

async fn delete_test(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let mut db = db.lock().unwrap();
    db.writes.push((format!("DELETE /tests/{}", id), JsonValue::Null));
    db.tests.retain(|t| t["_id"] != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn get_result(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let db = db.lock().unwrap();
    match db.results.iter().find(|r| r["_id"] == id) {
        Some(result) => Json(result.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "Result not found"),
    }
}

async fn write_collection(
    State(db): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let mut db = db.lock().unwrap();
    db.writes.push((format!("POST {}", uri.path()), body.clone()));
    let mut created = body;
    created["_id"] = json!("created-1");
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn update_item(
    State(db): State<Shared>,
    headers: HeaderMap,
    uri: Uri,
    Path(id): Path<String>,
    Json(body): Json<JsonValue>,
) -> Response {
    if let Err(resp) = record_token(&db, &headers) {
        return resp;
    }
    let mut db = db.lock().unwrap();
    db.writes.push((format!("PUT {}", uri.path()), body.clone()));
    Json(json!({ "_id": id, "updated": body })).into_response()
}

pub async fn spawn_upstream(db: Shared) -> Url {
    let app = Router::new()
        .route("/api/tests", get(list_tests))
        .route("/api/tests/:id", get(get_test).put(update_test).delete(delete_test))
        .route("/api/tests/:id/schedule", put(schedule_test))
        .route("/api/tests/:id/submit", post(submit_test))
        .route("/api/results/:id", get(get_result).put(update_item))
        .route("/api/questions", post(write_collection))
        .route("/api/questions/:id", put(update_item))
        .route("/api/users", post(write_collection))
        .with_state(db);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind upstream");
    let addr = listener.local_addr().expect("upstream addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("upstream server");
    });
    Url::parse(&format!("http://{}/api", addr)).unwrap()
}

pub async fn setup_app(db: Shared) -> Router {
    let upstream_api_url = spawn_upstream(db).await;
    let config = Config {
        server_address: "127.0.0.1:0".to_string(),
        upstream_api_url,
        jwt_secret: JWT_SECRET.to_string(),
        portal_rps: 1000,
        upstream_timeout_secs: 5,
        max_batch_size: Some(3),
        log_format: LogFormat::Text,
        cors_allowed_origins: Vec::new(),
    };
    let state = AppState::new(&config).expect("app state");
    routes::build_router(state, config.portal_rps)
}

pub fn token_for(user_id: &str, role: Role) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
        role,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
}

pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
    };
    (status, body)
}

pub fn iso(offset: Duration) -> String {
    (Utc::now() + offset).to_rfc3339()
}

pub fn question(id: &str, correct: &str, marks: f64) -> JsonValue {
    json!({
        "_id": id,
        "subject": "Math",
        "class": "JSS1",
        "text": [{ "type": "text", "value": "Solve" }, { "type": "formula", "value": "x^2 = 4" }],
        "options": ["1", "2", "3", "4"],
        "correctAnswer": correct,
        "marks": marks
    })
}
