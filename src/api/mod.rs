//! # API Module
//!
//! HTTP handlers for the agent server. The JSON-RPC endpoint forwards to the
//! same dispatcher the stdin/stdout transport uses.
//!
//! ## Available Endpoints
//!
//! - `GET /api/health` - Liveness plus the signing account
//! - `GET /api/chains` - Registered chains
//! - `GET /api/balance/:chain/:address?token=` - Native or ERC-20 balance
//! - `POST /api/rpc` - MCP tool calls over HTTP

pub mod balance;
pub mod chains;
pub mod health;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    mcp::{
        handler::handle_mcp_request,
        protocol::{error_codes, Request, Response},
    },
    AppState,
};

/// Builds the full HTTP application with every route mounted under `/api`.
pub fn create_router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/chains", get(chains::list_chains_handler))
        .route("/balance/:chain/:address", get(balance::get_balance_handler))
        // JSON-RPC endpoint for MCP tool calls
        .route("/rpc", post(rpc_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// Forward JSON-RPC requests over HTTP to the MCP handler
async fn rpc_handler(State(state): State<AppState>, Json(req): Json<Request>) -> Json<Response> {
    match handle_mcp_request(req, state).await {
        Some(resp) => Json(resp),
        None => Json(Response::error(
            serde_json::Value::Null,
            error_codes::INVALID_REQUEST,
            "Notifications are not supported over HTTP".into(),
        )),
    }
}
