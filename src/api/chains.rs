use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn list_chains_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "chains": state.client.chains() }))
}
