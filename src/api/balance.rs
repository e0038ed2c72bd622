use crate::{blockchain::models::BalanceRequest, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::error;

// Defines the structure for the chain and address extracted from the URL path.
#[derive(Debug, Deserialize)]
pub struct BalancePath {
    pub chain: String,
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub token: Option<String>,
}

// The handler function for the GET /balance/{chain}/{address}?token= endpoint.
pub async fn get_balance_handler(
    Path(path): Path<BalancePath>,
    Query(query): Query<BalanceQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let request = BalanceRequest {
        chain: path.chain,
        address: Some(path.address),
        token: query.token,
    };

    match state.client.get_balance(&request).await {
        Ok(balance) => (StatusCode::OK, Json(serde_json::json!(balance))).into_response(),
        Err(e) => {
            let status = if e.is_validation() {
                StatusCode::BAD_REQUEST
            } else {
                error!("Failed to get balance for {:?}: {}", request.address, e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (
                status,
                Json(serde_json::json!({ "error": e.to_string(), "kind": e.kind() })),
            )
                .into_response()
        }
    }
}
