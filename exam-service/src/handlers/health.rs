use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let generation = if state.questions.generation_enabled() {
        "gemini"
    } else {
        "offline"
    };

    Json(json!({
        "status": "ok",
        "service": "exam-service",
        "version": env!("CARGO_PKG_VERSION"),
        "generation": generation,
    }))
}
