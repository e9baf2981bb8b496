use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::response::{JsonRpcError, JsonRpcResponse};

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request envelope.
///
/// `jsonrpc` is kept loose so a wrong or missing version can be answered
/// with `-32600` instead of failing to decode. `id` distinguishes "absent"
/// (a notification) from an explicit `null`; either way it is echoed back
/// untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    /// Decode a parsed JSON body. Anything that is not a request object
    /// becomes a ready-made `-32600` response, carrying the `id` when one
    /// could be recovered.
    pub fn from_value(value: Value) -> Result<Self, JsonRpcResponse> {
        let id = value.get("id").cloned();
        if !value.is_object() {
            return Err(JsonRpcResponse::error(
                None,
                JsonRpcError::invalid_request_with("Invalid Request: expected a JSON object"),
            ));
        }

        serde_json::from_value(value).map_err(|e| {
            JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request_with(format!("Invalid Request: {e}")),
            )
        })
    }

    pub fn has_valid_version(&self) -> bool {
        self.jsonrpc.as_ref().and_then(Value::as_str) == Some(JSONRPC_VERSION)
    }

    /// No `id` member at all.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// MCP `initialize` params. Only used for logging; the result does not
/// depend on them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information sent during `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<Value>,
}
