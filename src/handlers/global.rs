use crate::client::ApiRequest;

use super::registry::{string_object_schema, Arguments, Tool, ToolError, ToolPlan};

pub fn tools() -> Vec<Tool> {
    vec![Tool::new(
        "global_health",
        "Check OpenCode Server health",
        string_object_schema(&[], &[]),
        health,
    )]
}

fn health(_: &Arguments) -> Result<ToolPlan, ToolError> {
    Ok(ApiRequest::get("/global/health").into())
}
