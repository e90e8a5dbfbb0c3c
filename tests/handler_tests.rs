//! Tests for the tool table and `tools/call` dispatch.
//!
//! Tool calls run against a recording backend, so each test can check the
//! exact request a tool plans and how the response is wrapped.

mod common;

use std::collections::HashSet;

use common::{initialized_server, tool_call, to_json, RecordingBackend};
use oho::handlers::{self, Arguments, SessionState, ToolError, ToolRegistry};
use oho::protocol::{JsonRpcRequest, RpcId};
use reqwest::Method;
use serde_json::{json, Value};

const TOOL_NAMES: [&str; 16] = [
    "session_list",
    "session_create",
    "session_get",
    "session_delete",
    "session_status",
    "message_list",
    "message_add",
    "config_get",
    "project_list",
    "project_current",
    "provider_list",
    "file_list",
    "file_content",
    "find_text",
    "find_file",
    "global_health",
];

fn args(value: Value) -> Arguments {
    value.as_object().cloned().unwrap()
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn registry_declares_tools_in_fixed_order() {
    let registry = ToolRegistry::builtin();
    let names: Vec<&str> = registry.iter().map(|t| t.name).collect();
    assert_eq!(names, TOOL_NAMES);
}

#[test]
fn registry_names_are_unique() {
    let registry = ToolRegistry::builtin();
    let unique: HashSet<&str> = registry.iter().map(|t| t.name).collect();
    assert_eq!(unique.len(), registry.len());
}

#[test]
fn required_arguments_are_listed_in_schema() {
    let registry = ToolRegistry::builtin();
    let required = |name: &str| -> Vec<String> {
        registry.get(name).unwrap().input_schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    };

    assert_eq!(required("session_get"), ["sessionId"]);
    assert_eq!(required("message_add"), ["sessionId", "content"]);
    assert_eq!(required("file_content"), ["path"]);
    assert_eq!(required("find_text"), ["pattern"]);
    assert_eq!(required("find_file"), ["query"]);
    assert!(required("session_list").is_empty());
    assert!(required("file_list").is_empty());
}

#[test]
fn plans_without_arguments_target_fixed_paths() {
    let registry = ToolRegistry::builtin();
    let empty = Arguments::new();
    let cases = [
        ("session_list", "/session"),
        ("session_status", "/session/status"),
        ("config_get", "/config"),
        ("project_list", "/project"),
        ("project_current", "/project/current"),
        ("provider_list", "/provider"),
        ("file_list", "/file"),
        ("global_health", "/global/health"),
    ];

    for (name, path) in cases {
        let plan = registry.get(name).unwrap().plan(&empty).unwrap();
        assert_eq!(plan.request.method, Method::GET, "{name}");
        assert_eq!(plan.request.path(), path, "{name}");
        assert!(plan.request.query.is_empty(), "{name}");
        assert!(plan.request.body.is_none(), "{name}");
    }
}

#[test]
fn missing_required_arguments_are_rejected_before_planning() {
    let registry = ToolRegistry::builtin();
    let cases = [
        ("session_get", json!({}), "sessionId"),
        ("session_delete", json!({ "sessionId": "" }), "sessionId"),
        ("message_list", json!({ "sessionId": 42 }), "sessionId"),
        ("message_add", json!({ "sessionId": "s1" }), "content"),
        ("file_content", json!({ "path": null }), "path"),
        ("find_text", json!({}), "pattern"),
        ("find_file", json!({ "query": "" }), "query"),
    ];

    for (name, raw, missing) in cases {
        let err = registry.get(name).unwrap().plan(&args(raw)).unwrap_err();
        assert!(err.is_invalid_input(), "{name}");
        assert!(matches!(err, ToolError::MissingArgument(key) if key == missing), "{name}");
        assert_eq!(err.to_string(), format!("{missing} is required"));
    }
}

#[test]
fn path_arguments_are_planned_as_whole_segments() {
    let registry = ToolRegistry::builtin();
    let plan = |name: &str, raw: Value| registry.get(name).unwrap().plan(&args(raw));

    let get = plan("session_get", json!({ "sessionId": "a/b?c" })).unwrap();
    assert_eq!(get.request.segments, ["session", "a/b?c"]);

    let add = plan("message_add", json!({ "sessionId": "ses_1", "content": "hi" })).unwrap();
    assert_eq!(add.request.segments, ["session", "ses_1", "message"]);

    let file = plan("file_content", json!({ "path": "/src//lib.rs" })).unwrap();
    assert_eq!(file.request.segments, ["file", "src", "lib.rs"]);
}

#[test]
fn dot_segments_are_rejected_before_planning() {
    let registry = ToolRegistry::builtin();
    let cases = [
        ("session_delete", json!({ "sessionId": ".." }), "sessionId"),
        ("session_get", json!({ "sessionId": "." }), "sessionId"),
        ("message_add", json!({ "sessionId": "..", "content": "hi" }), "sessionId"),
        ("file_content", json!({ "path": "src/../../etc/passwd" }), "path"),
        ("file_content", json!({ "path": "./Cargo.toml" }), "path"),
    ];

    for (name, raw, key) in cases {
        let err = registry.get(name).unwrap().plan(&args(raw)).unwrap_err();
        assert!(err.is_invalid_input(), "{name}");
        assert!(matches!(err, ToolError::DotSegment(k) if k == key), "{name}");
        assert_eq!(err.to_string(), format!("{key} must not contain '.' or '..' segments"));
    }

    let err = registry
        .get("file_content")
        .unwrap()
        .plan(&args(json!({ "path": "/" })))
        .unwrap_err();
    assert_eq!(err.to_string(), "path is required");
}

// ---------------------------------------------------------------------------
// tools/call through the server
// ---------------------------------------------------------------------------

#[tokio::test]
async fn session_get_without_session_id_makes_no_network_call() {
    let backend = RecordingBackend::returning("{}");
    let mut server = initialized_server(&backend).await;

    let resp = server.handle_line(&tool_call(2, "session_get", json!({}))).await.unwrap();
    let value = to_json(&resp);

    assert_eq!(value["id"], 2);
    assert_eq!(value["result"]["isError"], true);
    assert_eq!(value["result"]["content"][0]["text"], "sessionId is required");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn session_get_passes_body_through_verbatim() {
    let body = r#"{"id":"ses_1","title":"  spaced  "}"#;
    let backend = RecordingBackend::returning(body);
    let mut server = initialized_server(&backend).await;

    let resp = server
        .handle_line(&tool_call(3, "session_get", json!({ "sessionId": "ses_1" })))
        .await
        .unwrap();
    let value = to_json(&resp);

    assert_eq!(value["result"]["isError"], false);
    assert_eq!(value["result"]["content"][0]["type"], "text");
    assert_eq!(value["result"]["content"][0]["text"], body);

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::GET);
    assert_eq!(calls[0].path(), "/session/ses_1");
}

#[tokio::test]
async fn session_create_sends_only_non_empty_fields() {
    let backend = RecordingBackend::returning(r#"{"id":"ses_new"}"#);
    let mut server = initialized_server(&backend).await;

    server
        .handle_line(&tool_call(4, "session_create", json!({ "title": "demo", "path": "" })))
        .await
        .unwrap();
    server
        .handle_line(&tool_call(5, "session_create", json!({})))
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(calls[0].path(), "/session");
    assert_eq!(calls[0].body, Some(json!({ "title": "demo" })));
    assert_eq!(calls[1].body, Some(json!({})));
}

#[tokio::test]
async fn session_delete_prefixes_response() {
    let backend = RecordingBackend::returning("true");
    let mut server = initialized_server(&backend).await;

    let resp = server
        .handle_line(&tool_call(6, "session_delete", json!({ "sessionId": "ses_9" })))
        .await
        .unwrap();
    let value = to_json(&resp);

    assert_eq!(value["result"]["content"][0]["text"], "Session ses_9 deleted: true");
    let calls = backend.calls();
    assert_eq!(calls[0].method, Method::DELETE);
    assert_eq!(calls[0].path(), "/session/ses_9");
}

#[tokio::test]
async fn message_add_wraps_content_in_text_part() {
    let backend = RecordingBackend::returning("{}");
    let mut server = initialized_server(&backend).await;

    server
        .handle_line(&tool_call(
            7,
            "message_add",
            json!({ "sessionId": "ses_1", "content": "hello" }),
        ))
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls[0].method, Method::POST);
    assert_eq!(calls[0].path(), "/session/ses_1/message");
    assert_eq!(
        calls[0].body,
        Some(json!({ "parts": [{ "type": "text", "text": "hello" }] }))
    );
}

#[tokio::test]
async fn file_and_find_tools_build_queries() {
    let backend = RecordingBackend::returning("[]");
    let mut server = initialized_server(&backend).await;

    for line in [
        tool_call(10, "file_list", json!({ "path": "src" })),
        tool_call(11, "file_content", json!({ "path": "/src/main.rs" })),
        tool_call(12, "find_text", json!({ "pattern": "fn main" })),
        tool_call(13, "find_file", json!({ "query": "Cargo" })),
        tool_call(14, "message_list", json!({ "sessionId": "ses_2" })),
    ] {
        server.handle_line(&line).await.unwrap();
    }

    let calls = backend.calls();
    assert_eq!(calls[0].path(), "/file");
    assert_eq!(calls[0].query, vec![("path".to_string(), "src".to_string())]);
    assert_eq!(calls[1].path(), "/file/src/main.rs");
    assert!(calls[1].query.is_empty());
    assert_eq!(calls[2].path(), "/find/text");
    assert_eq!(calls[2].query, vec![("q".to_string(), "fn main".to_string())]);
    assert_eq!(calls[3].path(), "/find/file");
    assert_eq!(calls[3].query, vec![("q".to_string(), "Cargo".to_string())]);
    assert_eq!(calls[4].path(), "/session/ses_2/message");
}

#[tokio::test]
async fn backend_failure_becomes_error_result() {
    let backend = RecordingBackend::failing(500, "boom");
    let mut server = initialized_server(&backend).await;

    let resp = server
        .handle_line(&tool_call(20, "global_health", json!({})))
        .await
        .unwrap();
    let value = to_json(&resp);

    assert!(value.get("error").is_none(), "tool failures are not protocol errors");
    assert_eq!(value["result"]["isError"], true);
    assert_eq!(value["result"]["content"][0]["text"], "API error [500]: boom");
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn unknown_tool_is_error_result() {
    let backend = RecordingBackend::returning("{}");
    let mut server = initialized_server(&backend).await;

    let resp = server
        .handle_line(&tool_call(21, "session_explode", json!({})))
        .await
        .unwrap();
    let value = to_json(&resp);

    assert!(value.get("error").is_none());
    assert_eq!(value["result"]["isError"], true);
    assert_eq!(value["result"]["content"][0]["text"], "Unknown tool: session_explode");
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn failed_call_leaves_session_usable() {
    let backend = RecordingBackend::failing(503, "down");
    let mut server = initialized_server(&backend).await;

    server.handle_line(&tool_call(30, "session_list", json!({}))).await.unwrap();
    assert_eq!(server.state(), SessionState::Initialized);

    let resp = server
        .handle_line(r#"{"jsonrpc":"2.0","id":31,"method":"tools/list"}"#)
        .await
        .unwrap();
    assert_eq!(to_json(&resp)["result"]["tools"].as_array().unwrap().len(), 16);
}

// ---------------------------------------------------------------------------
// Dispatch called directly
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatch_tools_list_advertises_all_tools() {
    let backend = RecordingBackend::returning("{}");
    let registry = ToolRegistry::builtin();
    let mut state = SessionState::Initialized;

    let req = JsonRpcRequest::new(Some(RpcId::from(1)), "tools/list", None);
    let response = handlers::dispatch(&req, &mut state, &registry, &*backend)
        .await
        .unwrap();
    let result = response.result.unwrap();
    let tools = result["tools"].as_array().unwrap();

    let tool_names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(tool_names, TOOL_NAMES);
    for tool in tools {
        assert!(tool["description"].as_str().is_some_and(|d| !d.is_empty()));
        assert_eq!(tool["inputSchema"]["type"], "object");
    }
    assert_eq!(backend.call_count(), 0, "tools/list performs no network call");
}

#[tokio::test]
async fn dispatch_tools_call_with_missing_arguments_object() {
    let backend = RecordingBackend::returning(r#"{"healthy":true}"#);
    let registry = ToolRegistry::builtin();
    let mut state = SessionState::Initialized;

    let req = JsonRpcRequest::new(
        Some(RpcId::from(2)),
        "tools/call",
        Some(json!({ "name": "global_health" })),
    );
    let response = handlers::dispatch(&req, &mut state, &registry, &*backend)
        .await
        .unwrap();
    let result = response.result.unwrap();

    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["text"], r#"{"healthy":true}"#);
}
