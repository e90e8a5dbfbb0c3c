#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use oho::client::{ApiRequest, Backend, ClientError};
use oho::server::McpServer;
use serde_json::Value;

enum Reply {
    Body(String),
    Status(u16, String),
}

/// Backend stub that records every request and answers with a fixed reply.
pub struct RecordingBackend {
    calls: Mutex<Vec<ApiRequest>>,
    reply: Reply,
}

impl RecordingBackend {
    pub fn returning(body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Reply::Body(body.to_string()),
        })
    }

    pub fn failing(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Reply::Status(status, body.to_string()),
        })
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn send(&self, request: &ApiRequest) -> Result<String, ClientError> {
        self.calls.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Body(body) => Ok(body.clone()),
            Reply::Status(status, body) => Err(ClientError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

pub const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"x","version":"1"}}}"#;

pub fn server_with(backend: &Arc<RecordingBackend>) -> McpServer {
    McpServer::new(backend.clone())
}

/// A server that has already completed `initialize`.
pub async fn initialized_server(backend: &Arc<RecordingBackend>) -> McpServer {
    let mut server = server_with(backend);
    server.handle_line(INITIALIZE).await.unwrap();
    server
}

/// Serialize a response the way it goes on the wire, then parse it back.
pub fn to_json(resp: &oho::protocol::JsonRpcResponse) -> Value {
    serde_json::to_value(resp).unwrap()
}

/// `tools/call` request line.
pub fn tool_call(id: i64, name: &str, arguments: Value) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
    .to_string()
}
