use serde_json::{json, Map, Value};

use crate::client::ApiRequest;

use super::registry::{
    optional_str, required_segment, string_object_schema, Arguments, Tool, ToolError, ToolPlan,
};

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "session_list",
            "List all OpenCode sessions",
            string_object_schema(&[], &[]),
            list,
        ),
        Tool::new(
            "session_create",
            "Create a new OpenCode session",
            string_object_schema(
                &[
                    ("title", "Session title"),
                    ("path", "Working directory for the session"),
                ],
                &[],
            ),
            create,
        ),
        Tool::new(
            "session_get",
            "Get details of a session",
            string_object_schema(&[("sessionId", "Session ID")], &["sessionId"]),
            get,
        ),
        Tool::new(
            "session_delete",
            "Delete a session",
            string_object_schema(&[("sessionId", "Session ID")], &["sessionId"]),
            delete,
        ),
        Tool::new(
            "session_status",
            "Get the status of all sessions",
            string_object_schema(&[], &[]),
            status,
        ),
    ]
}

fn list(_: &Arguments) -> Result<ToolPlan, ToolError> {
    Ok(ApiRequest::get("/session").into())
}

fn create(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let mut body = Map::new();
    for key in ["title", "path"] {
        if let Some(value) = optional_str(args, key) {
            body.insert(key.to_string(), json!(value));
        }
    }
    Ok(ApiRequest::post("/session", Value::Object(body)).into())
}

fn get(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let id = required_segment(args, "sessionId")?;
    Ok(ApiRequest::get("/session").segment(id).into())
}

fn delete(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let id = required_segment(args, "sessionId")?;
    Ok(ToolPlan::new(ApiRequest::delete("/session").segment(id))
        .with_prefix(format!("Session {id} deleted: ")))
}

fn status(_: &Arguments) -> Result<ToolPlan, ToolError> {
    Ok(ApiRequest::get("/session/status").into())
}
