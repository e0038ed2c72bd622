//! # MCP Handler Module
//!
//! This module implements the Model Context Protocol (MCP) for the agent server.
//! It handles incoming MCP requests and dispatches them to the blockchain tools.
//!
//! ## Supported Tools
//!
//! - `get_balance` - Native or ERC-20 balance of an account
//! - `transfer` - Send native value or ERC-20 tokens
//! - `swap` - Swap through the chain's router (approves the router when needed)
//! - `get_quote` - Price a swap without submitting anything
//! - `list_chains` - Registered chains and their tokens
//!
//! Tool arguments are parsed into typed requests once, here. Domain errors come
//! back as JSON-RPC errors whose `data.kind` names the error kind.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::{
    blockchain::{
        error::AgentError,
        models::{BalanceRequest, QuoteRequest, SwapRequest, TransferRequest},
    },
    mcp::protocol::{error_codes, Request, Response},
    utils, AppState,
};

const TOOL_NAMES: &[&str] = &["get_balance", "transfer", "swap", "get_quote", "list_chains"];

// Helper: produce a result Value that always contains a text content array
// and preserves structured data for JSON-friendly clients.
fn make_texty_result(text: String, payload: Value) -> Value {
    let content = json!([{ "type": "text", "text": text }]);
    match payload {
        Value::Object(mut map) => {
            // Do not overwrite if caller already set content
            if !map.contains_key("content") {
                map.insert("content".into(), content);
            }
            Value::Object(map)
        }
        other => json!({
            "data": other,
            "content": content
        }),
    }
}

fn error_response(req_id: &Value, err: AgentError) -> Response {
    if !err.is_validation() {
        error!("Tool call failed ({}): {}", err.kind(), describe(&err));
    }
    Response::agent_error(req_id.clone(), &err)
}

// The error followed by its source chain, for the server log.
fn describe(err: &AgentError) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    text
}

fn success<T: Serialize>(req_id: &Value, summary: String, result: &T) -> Response {
    let payload = serde_json::to_value(result).unwrap_or(Value::Null);
    Response::success(req_id.clone(), make_texty_result(summary, payload))
}

/// This is the main dispatcher for all incoming MCP requests.
pub async fn handle_mcp_request(req: Request, state: AppState) -> Option<Response> {
    info!("Handling MCP request for method: {}", req.method);

    if req.is_notification() {
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(&req),
        "tools/list" => handle_tools_list(&req),
        "tools/call" => handle_tool_call(req, state).await,
        // Convenience aliases: direct method calls are rewritten into tools/call
        name if TOOL_NAMES.contains(&name) => {
            let wrapped = Request {
                jsonrpc: req.jsonrpc.clone(),
                id: req.id.clone(),
                method: "tools/call".to_string(),
                params: Some(json!({
                    "name": name,
                    "arguments": req.params.clone().unwrap_or_else(|| json!({}))
                })),
            };
            handle_tool_call(wrapped, state).await
        }
        _ => Response::error(
            req.id,
            error_codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", req.method),
        ),
    };

    Some(response)
}

/// Handles a 'tools/call' request by dispatching it to the correct tool logic.
async fn handle_tool_call(req: Request, state: AppState) -> Response {
    let params = match req.params.as_ref() {
        Some(p) => p,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'params' object".into(),
            )
        }
    };

    let tool_name = match params.get("name").and_then(|n| n.as_str()) {
        Some(name) => name,
        None => {
            return Response::error(
                req.id,
                error_codes::INVALID_PARAMS,
                "Missing 'name' field in params".into(),
            )
        }
    };

    let empty_args = json!({});
    let args = params.get("arguments").unwrap_or(&empty_args);
    let req_id = &req.id;
    let default_chain = state.config.default_chain.as_str();
    let mode = state.config.encryption_mode;

    let res: Result<Response, Response> = match tool_name {
        "get_balance" => (async {
            let request: BalanceRequest = utils::parse_args(args, default_chain, req_id)?;
            let balance = state
                .client
                .get_balance(&request)
                .await
                .map_err(|e| error_response(req_id, e))?;
            let text = format!("Balance of {} on {}: {} {}", balance.address, balance.chain, balance.amount, balance.token);
            Ok(success(req_id, text, &balance))
        })
        .await,
        "transfer" => (async {
            let request: TransferRequest = utils::parse_args(args, default_chain, req_id)?;
            let result = state
                .client
                .transfer(&request, mode)
                .await
                .map_err(|e| error_response(req_id, e))?;
            let text = format!(
                "Sent {} {} to {} on {} (tx {}, encrypted: {})",
                result.amount, result.token, result.recipient, result.chain, result.tx_hash, result.encrypted
            );
            Ok(success(req_id, text, &result))
        })
        .await,
        "swap" => (async {
            let request: SwapRequest = utils::parse_args(args, default_chain, req_id)?;
            let result = state
                .client
                .swap(&request, mode)
                .await
                .map_err(|e| error_response(req_id, e))?;
            let text = format!(
                "Swapped {} {} for {} {} on {} (tx {}, encrypted: {})",
                result.amount_in,
                result.input_token,
                result.amount_out,
                result.output_token,
                result.chain,
                result.tx_hash,
                result.encrypted
            );
            Ok(success(req_id, text, &result))
        })
        .await,
        "get_quote" => (async {
            let request: QuoteRequest = utils::parse_args(args, default_chain, req_id)?;
            let quote = state
                .client
                .quote(&request)
                .await
                .map_err(|e| error_response(req_id, e))?;
            let text = format!(
                "{} {} -> {} {} (minimum {} at {}% slippage)",
                quote.amount_in, quote.input_token, quote.amount_out, quote.output_token, quote.amount_out_min, quote.slippage
            );
            Ok(success(req_id, text, &quote))
        })
        .await,
        "list_chains" => {
            let chains = state.client.chains();
            let names: Vec<&str> = chains.iter().map(|c| c.name.as_str()).collect();
            let text = format!("Supported chains: {}", names.join(", "));
            Ok(Response::success(
                req_id.clone(),
                make_texty_result(text, json!({ "chains": chains })),
            ))
        }
        _ => Err(Response::error(
            req_id.clone(),
            error_codes::METHOD_NOT_FOUND,
            format!("Unknown tool: {}", tool_name),
        )),
    };

    res.unwrap_or_else(|err_resp| err_resp)
}

/// Handles the 'initialize' request.
fn handle_initialize(req: &Request) -> Response {
    let server_info = json!({
        "name": "fair_mcp",
        "version": env!("CARGO_PKG_VERSION")
    });
    let capabilities = json!({ "tools": { "listChanged": false } });
    let instructions =
        "EVM agent tools: balances, native and ERC-20 transfers, and router swaps, with optional transaction encryption.";

    Response::success(
        req.id.clone(),
        json!({
            "serverInfo": server_info,
            "protocolVersion": "2025-06-18",
            "capabilities": capabilities,
            "instructions": instructions
        }),
    )
}

/// Handles the 'tools/list' request by returning a JSON definition of all available tools.
fn handle_tools_list(req: &Request) -> Response {
    let chain = json!({"type": "string", "description": "Chain name (e.g. 'fair-testnet') or numeric chain id. Defaults to the server's default chain."});
    let encrypt = json!({"type": "boolean", "description": "Encrypt the transaction before signing. Always on when the server runs in automatic mode."});
    let tools = json!([
        {
            "name": "get_balance",
            "description": "Get the native or ERC-20 token balance of an address. Omit the address to use the agent's wallet.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "chain": chain,
                    "address": {"type": "string", "description": "The 0x... address to check."},
                    "token": {"type": "string", "description": "Token symbol, 'native', or token contract address. Defaults to the native token."}
                }
            }
        },
        {
            "name": "transfer",
            "description": "Send native tokens or ERC-20 tokens to a recipient.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "chain": chain,
                    "recipient": {"type": "string", "description": "The 0x... recipient address."},
                    "amount": {"type": "string", "description": "Decimal amount, e.g. '1.0'."},
                    "token": {"type": "string", "description": "Token symbol or address. Defaults to the native token."},
                    "encrypt": encrypt
                },
                "required": ["recipient", "amount"]
            }
        },
        {
            "name": "swap",
            "description": "Swap tokens through the chain's router. Approves the router first when the allowance is too low.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "chain": chain,
                    "inputToken": {"type": "string", "description": "Token to sell (symbol or address)."},
                    "outputToken": {"type": "string", "description": "Token to buy (symbol or address)."},
                    "amount": {"type": "string", "description": "Decimal amount of the input token."},
                    "slippage": {"type": "number", "description": "Slippage tolerance in percent, 0 to 50. Defaults to 0.5."},
                    "encrypt": encrypt
                },
                "required": ["inputToken", "outputToken", "amount"]
            }
        },
        {
            "name": "get_quote",
            "description": "Price a swap without submitting any transaction.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "chain": chain,
                    "inputToken": {"type": "string"},
                    "outputToken": {"type": "string"},
                    "amount": {"type": "string"},
                    "slippage": {"type": "number"}
                },
                "required": ["inputToken", "outputToken", "amount"]
            }
        },
        {
            "name": "list_chains",
            "description": "List supported chains, their native token and known token symbols.",
            "inputSchema": { "type": "object", "properties": {}, "additionalProperties": false }
        }
    ]);
    Response::success(req.id.clone(), json!({ "tools": tools }))
}
