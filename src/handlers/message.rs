use serde_json::json;

use crate::client::ApiRequest;

use super::registry::{
    required_segment, required_str, string_object_schema, Arguments, Tool, ToolError, ToolPlan,
};

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "message_list",
            "List all messages in a session",
            string_object_schema(&[("sessionId", "Session ID")], &["sessionId"]),
            list,
        ),
        Tool::new(
            "message_add",
            "Send a message to a session",
            string_object_schema(
                &[("sessionId", "Session ID"), ("content", "Message text")],
                &["sessionId", "content"],
            ),
            add,
        ),
    ]
}

fn list(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let id = required_segment(args, "sessionId")?;
    Ok(ApiRequest::get("/session")
        .segment(id)
        .segment("message")
        .into())
}

/// Sends `content` as a single text part.
fn add(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let id = required_segment(args, "sessionId")?;
    let content = required_str(args, "content")?;
    let body = json!({
        "parts": [
            { "type": "text", "text": content }
        ]
    });
    Ok(ApiRequest::post("/session", body)
        .segment(id)
        .segment("message")
        .into())
}
