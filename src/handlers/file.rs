use crate::client::ApiRequest;

use super::registry::{
    optional_str, required_path, required_str, string_object_schema, Arguments, Tool, ToolError,
    ToolPlan,
};

pub fn tools() -> Vec<Tool> {
    vec![
        Tool::new(
            "file_list",
            "List files in a directory",
            string_object_schema(&[("path", "Directory to list (project root if omitted)")], &[]),
            list,
        ),
        Tool::new(
            "file_content",
            "Read the content of a file",
            string_object_schema(&[("path", "File path relative to the project")], &["path"]),
            content,
        ),
        Tool::new(
            "find_text",
            "Search the project for text",
            string_object_schema(&[("pattern", "Text or pattern to search for")], &["pattern"]),
            find_text,
        ),
        Tool::new(
            "find_file",
            "Find files by name",
            string_object_schema(&[("query", "File name query")], &["query"]),
            find_file,
        ),
    ]
}

fn list(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let request = match optional_str(args, "path") {
        Some(path) => ApiRequest::get("/file").query("path", path),
        None => ApiRequest::get("/file"),
    };
    Ok(request.into())
}

fn content(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let request = required_path(args, "path")?
        .into_iter()
        .fold(ApiRequest::get("/file"), |request, segment| request.segment(segment));
    Ok(request.into())
}

fn find_text(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let pattern = required_str(args, "pattern")?;
    Ok(ApiRequest::get("/find/text").query("q", pattern).into())
}

fn find_file(args: &Arguments) -> Result<ToolPlan, ToolError> {
    let query = required_str(args, "query")?;
    Ok(ApiRequest::get("/find/file").query("q", query).into())
}
