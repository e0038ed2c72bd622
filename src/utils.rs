//! Utility functions for the MCP server

use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

use crate::mcp::protocol::{error_codes, Response};

/// Deserializes tool arguments into a typed request, filling in `chain` with
/// `default_chain` when the caller named none.
pub fn parse_args<T: DeserializeOwned>(args: &Value, default_chain: &str, req_id: &Value) -> Result<T, Response> {
    let mut args = match args {
        Value::Object(map) => Value::Object(map.clone()),
        Value::Null => Value::Object(Default::default()),
        _ => {
            return Err(Response::error(
                req_id.clone(),
                error_codes::INVALID_PARAMS,
                "Tool arguments must be a JSON object".into(),
            ))
        }
    };

    if let Some(map) = args.as_object_mut() {
        let has_chain = ["chain", "chain_id", "network"]
            .iter()
            .any(|k| map.get(*k).and_then(Value::as_str).map_or(false, |s| !s.trim().is_empty()));
        if !has_chain {
            map.retain(|k, _| k != "chain_id" && k != "network");
            map.insert("chain".into(), Value::String(default_chain.to_string()));
        }
    }

    from_value(args).map_err(|e| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Missing or invalid arguments: {}", e),
        )
    })
}
