pub mod file;
pub mod global;
pub mod message;
pub mod registry;
pub mod session;
pub mod workspace;

use serde::Serialize;
use serde_json::json;

use crate::client::Backend;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId,
    ToolCallParams,
};

pub use registry::{Arguments, Tool, ToolError, ToolPlan, ToolRegistry};

/// Handshake state of one bridge session. There is no way back from
/// `Initialized`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initialized,
}

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(
    req: &JsonRpcRequest,
    state: &mut SessionState,
    registry: &ToolRegistry,
    backend: &dyn Backend,
) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => {
            // Never fails: unreadable params are ignored.
            let params: InitializeParams = match &req.params {
                Some(v) => serde_json::from_value(v.clone()).unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "ignoring malformed initialize params");
                    InitializeParams::default()
                }),
                None => InitializeParams::default(),
            };
            let client = params.client_info.as_ref();
            tracing::info!(
                client = client.and_then(|c| c.name.as_deref()).unwrap_or("unknown"),
                client_version = client.and_then(|c| c.version.as_deref()).unwrap_or("unknown"),
                protocol = params.protocol_version.as_deref().unwrap_or("unspecified"),
                "MCP client initialized"
            );

            *state = SessionState::Initialized;
            Some(success(req.id.clone(), &InitializeResult::current()))
        }

        _ if req.is_notification() => {
            tracing::debug!(method = %req.method, "notification received");
            None
        }

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), json!({ "status": "pong" }))),

        "tools/list" => {
            if *state != SessionState::Initialized {
                return Some(not_initialized(req));
            }
            let result = json!({ "tools": registry.descriptors() });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        "tools/call" => {
            if *state != SessionState::Initialized {
                return Some(not_initialized(req));
            }

            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::debug!(error = %e, "invalid tools/call params");
                        return Some(JsonRpcResponse::error(
                            req.id.clone(),
                            JsonRpcError::invalid_params(),
                        ));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        req.id.clone(),
                        JsonRpcError::invalid_params(),
                    ));
                }
            };

            let args = params.arguments.unwrap_or_default();
            let tool_result = registry.call(&params.name, &args, backend).await;
            Some(success(req.id.clone(), &tool_result))
        }

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

fn not_initialized(req: &JsonRpcRequest) -> JsonRpcResponse {
    tracing::debug!(method = %req.method, "rejected before initialize");
    JsonRpcResponse::error(req.id.clone(), JsonRpcError::not_initialized())
}

fn success<T: Serialize>(id: Option<RpcId>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(e.to_string())),
    }
}
