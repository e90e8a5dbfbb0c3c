pub mod request;
pub mod response;

pub use request::{ClientInfo, InitializeParams, JsonRpcRequest, RpcId, ToolCallParams};
pub use response::{
    InitializeResult, JsonRpcError, JsonRpcResponse, ServerInfo, ToolDescriptor, ToolResult,
    ToolResultContent, PROTOCOL_VERSION, SERVER_NAME,
};
