//! Server configuration, projects and providers. All read-only, no
//! arguments.

use crate::client::ApiRequest;

use super::registry::{string_object_schema, Arguments, Tool, ToolError, ToolPlan};

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "config_get",
            "Get the OpenCode configuration",
            string_object_schema(&[], &[]),
            config_get,
        ),
        Tool::new(
            "project_list",
            "List all projects",
            string_object_schema(&[], &[]),
            project_list,
        ),
        Tool::new(
            "project_current",
            "Get the current project",
            string_object_schema(&[], &[]),
            project_current,
        ),
        Tool::new(
            "provider_list",
            "List all available AI providers",
            string_object_schema(&[], &[]),
            provider_list,
        ),
    ]
}

fn config_get(_: &Arguments) -> Result<ToolPlan, ToolError> {
    Ok(ApiRequest::get("/config").into())
}

fn project_list(_: &Arguments) -> Result<ToolPlan, ToolError> {
    Ok(ApiRequest::get("/project").into())
}

fn project_current(_: &Arguments) -> Result<ToolPlan, ToolError> {
    Ok(ApiRequest::get("/project/current").into())
}

fn provider_list(_: &Arguments) -> Result<ToolPlan, ToolError> {
    Ok(ApiRequest::get("/provider").into())
}
