use axum::{extract::State, response::IntoResponse, Json};

use crate::AppState;

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "account": format!("{:?}", state.client.gateway().account()),
        "defaultChain": state.config.default_chain,
        "encryptionMode": state.config.encryption_mode,
    }))
}
