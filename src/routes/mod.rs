pub mod health;
pub mod questions;
pub mod resources;
pub mod results;
pub mod student;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use crate::middleware::auth::{require_bearer_auth, require_capability};
use crate::middleware::rate_limit::{new_rps_state, rps_middleware};
use crate::models::user::Capability;
use crate::services::upstream_service::Resource;
use crate::AppState;

/// Every `/api` group requires a bearer token; each group is then gated on
/// one capability.
pub fn build_router(state: AppState, rps: u32) -> Router {
    let student_api = Router::new()
        .route("/api/student/tests", get(student::list_tests))
        .route("/api/student/tests/:id", get(student::enter_test))
        .route("/api/student/tests/:id/submit", post(student::submit_test))
        .route_layer(from_fn_with_state(Capability::TakeTests, require_capability));

    let authoring_api = Router::new()
        .route("/api/tests", get(tests::list_tests))
        .route(
            "/api/tests/:id",
            get(tests::get_test)
                .put(tests::update_test)
                .delete(tests::delete_test),
        )
        .route("/api/tests/:id/status", post(tests::change_status))
        .route_layer(from_fn_with_state(Capability::AuthorTests, require_capability));

    let scheduling_api = Router::new()
        .route("/api/tests/:id/schedule", put(tests::schedule_test))
        .route_layer(from_fn_with_state(Capability::ScheduleTests, require_capability));

    let question_bank_api = Router::new()
        .route(
            "/api/questions",
            get(questions::list_questions).post(questions::create_question),
        )
        .route(
            "/api/questions/:id",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route_layer(from_fn_with_state(Capability::ManageQuestionBank, require_capability));

    let results_api = Router::new()
        .route("/api/results", get(results::list_results))
        .route("/api/results/:id", get(results::get_result))
        .route("/api/results/:id/score", put(results::correct_score))
        .route_layer(from_fn_with_state(Capability::CorrectScores, require_capability));

    let admin_api = Router::new()
        .merge(resources::resource_router(Resource::Users))
        .merge(resources::resource_router(Resource::Classes))
        .merge(resources::resource_router(Resource::Sessions))
        .route_layer(from_fn_with_state(Capability::ManageUsers, require_capability));

    let api = Router::new()
        .merge(student_api)
        .merge(authoring_api)
        .merge(scheduling_api)
        .merge(question_bank_api)
        .merge(results_api)
        .merge(admin_api)
        .layer(from_fn_with_state(new_rps_state(rps), rps_middleware))
        .layer(from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(state)
}
