pub mod request;
pub mod response;

pub use request::{ClientInfo, InitializeParams, JsonRpcRequest, ToolCallParams, JSONRPC_VERSION};
pub use response::{
    JsonRpcError, JsonRpcResponse, ToolDefinition, ToolResult, ToolResultContent,
};
