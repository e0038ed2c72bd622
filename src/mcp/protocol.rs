// src/mcp/protocol.rs

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::blockchain::error::AgentError;

/// One JSON-RPC 2.0 message from the client. A null `id` marks a notification.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    #[serde(default = "default_jsonrpc")]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

fn default_jsonrpc() -> String {
    "2.0".to_string()
}

impl Request {
    pub fn is_notification(&self) -> bool {
        self.id.is_null()
    }
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: String) -> Self {
        Self::with_error(id, ErrorObject { code, message, data: None })
    }

    pub fn error_with_data(id: Value, code: i32, message: String, data: Value) -> Self {
        Self::with_error(id, ErrorObject { code, message, data: Some(data) })
    }

    /// Validation failures become `INVALID_PARAMS`, everything else
    /// `INTERNAL_ERROR`. `data.kind` carries the stable error kind.
    pub fn agent_error(id: Value, err: &AgentError) -> Self {
        let code = if err.is_validation() {
            error_codes::INVALID_PARAMS
        } else {
            error_codes::INTERNAL_ERROR
        };
        Self::error_with_data(id, code, err.to_string(), json!({ "kind": err.kind() }))
    }

    fn with_error(id: Value, error: ErrorObject) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}
