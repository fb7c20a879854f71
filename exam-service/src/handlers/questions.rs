use crate::models::Question;
use crate::startup::AppState;
use axum::{extract::State, response::Response, Json};
use service_core::middleware::preflight_response;

/// `GET /api/questions`: always 200 with a complete question set.
pub async fn get_questions(State(state): State<AppState>) -> Json<Vec<Question>> {
    Json(state.questions.get_questions().await)
}

/// `OPTIONS /api/questions`: answered without touching the provider.
pub async fn questions_preflight() -> Response {
    preflight_response()
}
