use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON-RPC 2.0 id: a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(serde_json::Number),
    Str(String),
}

impl From<i64> for RpcId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RpcId {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

/// JSON-RPC 2.0 request envelope.
///
/// `id` is `None` both when the member is absent and when it is `null`;
/// either way the response echoes `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<RpcId>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: Option<RpcId>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: Some("2.0".into()),
            id,
            method: method.into(),
            params,
        }
    }

    /// Notifications never receive a response.
    pub fn is_notification(&self) -> bool {
        self.method.starts_with("notifications/")
    }
}

/// MCP `initialize` params. Every field is optional and unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Value>,
    #[serde(rename = "clientInfo", default)]
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
    #[serde(default)]
    pub arguments: Option<Map<String, Value>>,
}
