pub mod geocode;
pub mod health;
pub mod poi_search;
pub mod reverse_geocode;
pub mod route;

use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::envelope::{Envelope, ErrorCode};
use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams,
    ToolDefinition, ToolResult,
};
use crate::registry::{panic_message, ToolError, ToolRegistry};

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "osm-mcp-server";

fn latitude() -> Value {
    json!({ "type": "number", "minimum": -90, "maximum": 90 })
}

fn longitude() -> Value {
    json!({ "type": "number", "minimum": -180, "maximum": 180 })
}

/// `[lat, lon]`
fn point() -> Value {
    json!({
        "type": "array",
        "prefixItems": [latitude(), longitude()],
        "minItems": 2,
        "maxItems": 2
    })
}

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(req: &JsonRpcRequest, registry: &ToolRegistry) -> Option<JsonRpcResponse> {
    if !req.has_valid_version() {
        return Some(JsonRpcResponse::error(req.id.clone(), JsonRpcError::invalid_request()));
    }

    let response = match req.method.as_str() {
        "initialize" => {
            let params: InitializeParams = req
                .params
                .clone()
                .and_then(|p| serde_json::from_value(p).ok())
                .unwrap_or_default();
            let client = params.client_info.as_ref().and_then(|c| c.name.as_deref());
            info!(
                client = client.unwrap_or("unknown"),
                protocol_version = params.protocol_version.as_deref().unwrap_or("unspecified"),
                "client initializing"
            );

            let result = json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            JsonRpcResponse::success(req.id.clone(), result)
        }

        method if method.starts_with("notifications/") => {
            debug!(method, "notification received");
            return None;
        }

        "ping" => JsonRpcResponse::success(req.id.clone(), json!({})),

        "tools/list" => {
            let tools: Vec<ToolDefinition> = registry.list().iter().map(ToolDefinition::from).collect();
            JsonRpcResponse::success(req.id.clone(), json!({ "tools": tools }))
        }

        "tools/call" => call_tool(req, registry).await,

        _ => JsonRpcResponse::error(req.id.clone(), JsonRpcError::method_not_found(&req.method)),
    };

    if req.is_notification() {
        debug!(method = %req.method, "dropping response to notification");
        return None;
    }
    Some(response)
}

async fn call_tool(req: &JsonRpcRequest, registry: &ToolRegistry) -> JsonRpcResponse {
    let params: ToolCallParams = match &req.params {
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(p) => p,
            Err(e) => {
                return JsonRpcResponse::error(
                    req.id.clone(),
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {e}")),
                );
            }
        },
        None => {
            return JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_params("Missing params for tools/call"),
            );
        }
    };

    let Some(tool) = registry.find(&params.name) else {
        warn!(tool = %params.name, "unknown tool requested");
        return JsonRpcResponse::error(req.id.clone(), JsonRpcError::unknown_tool(&params.name));
    };

    let started = Instant::now();
    let envelope = match tool.call(params.arguments).await {
        Ok(envelope) => envelope,
        Err(ToolError::Validation(errors)) => {
            info!(tool = tool.name(), violations = errors.violations().len(), "tool arguments rejected");
            Envelope::failure(ErrorCode::ValidationError, errors.to_string())
        }
        Err(ToolError::Internal(message)) => {
            error!(tool = tool.name(), error = %message, "tool failed");
            Envelope::failure(ErrorCode::InternalError, message)
        }
    };

    info!(
        tool = tool.name(),
        ok = envelope.is_ok(),
        code = envelope.error().map(|e| e.code.as_str()),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "tool call finished"
    );

    match ToolResult::from_envelope(&envelope).and_then(serde_json::to_value) {
        Ok(result) => JsonRpcResponse::success(req.id.clone(), result),
        Err(e) => JsonRpcResponse::error(req.id.clone(), JsonRpcError::internal_error(e.to_string())),
    }
}

/// Decode one raw HTTP body and dispatch it.
///
/// Dispatch runs on its own task so a panic outside any tool handler turns
/// into a `-32603` response instead of taking the connection down with it.
/// Handler panics are caught earlier and reported as `INTERNAL_ERROR`.
pub async fn handle_message(body: &[u8], registry: Arc<ToolRegistry>) -> Option<JsonRpcResponse> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparseable JSON-RPC body");
            return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
        }
    };

    let req = match JsonRpcRequest::from_value(value) {
        Ok(req) => req,
        Err(resp) => return Some(resp),
    };

    let id = req.id.clone();
    let method = req.method.clone();
    match tokio::spawn(async move { dispatch(&req, &registry).await }).await {
        Ok(resp) => resp,
        Err(e) => {
            let message = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            error!(method = %method, error = %message, "dispatch aborted");
            id.map(|id| JsonRpcResponse::error(Some(id), JsonRpcError::internal_error(message)))
        }
    }
}
