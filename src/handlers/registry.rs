//! The static tool table.
//!
//! Each [`Tool`] pairs its MCP descriptor with a planner: a plain function
//! that validates the call arguments and describes the single backend
//! request to make. Executing the plan is the registry's job, so the
//! per-resource modules stay free of I/O.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::client::{is_dot_segment, ApiRequest, Backend, ClientError};
use crate::protocol::{ToolDescriptor, ToolResult};

use super::{file, global, message, session, workspace};

/// Arguments of a `tools/call`, as sent by the client.
pub type Arguments = Map<String, Value>;

/// Turns call arguments into a backend request.
pub type Planner = fn(&Arguments) -> Result<ToolPlan, ToolError>;

/// Tool-level failure, reported as `isError: true` rather than a JSON-RPC
/// error.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Rejected before any network call.
    #[error("{0} is required")]
    MissingArgument(&'static str),
    /// A path argument that would resolve to a different route.
    #[error("{0} must not contain '.' or '..' segments")]
    DotSegment(&'static str),
    /// The backend call itself failed.
    #[error(transparent)]
    Backend(#[from] ClientError),
}

impl ToolError {
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::MissingArgument(_) | Self::DotSegment(_))
    }
}

/// The backend request a tool wants made, plus how to present its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolPlan {
    pub request: ApiRequest,
    prefix: Option<String>,
}

impl ToolPlan {
    pub fn new(request: ApiRequest) -> Self {
        Self { request, prefix: None }
    }

    /// Text placed in front of the response body.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn render(&self, body: String) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{body}"),
            None => body,
        }
    }
}

impl From<ApiRequest> for ToolPlan {
    fn from(request: ApiRequest) -> Self {
        Self::new(request)
    }
}

pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
    planner: Planner,
}

impl Tool {
    pub fn new(
        name: &'static str,
        description: &'static str,
        input_schema: Value,
        planner: Planner,
    ) -> Self {
        Self {
            name,
            description,
            input_schema,
            planner,
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.into(),
            description: self.description.into(),
            input_schema: self.input_schema.clone(),
        }
    }

    pub fn plan(&self, args: &Arguments) -> Result<ToolPlan, ToolError> {
        (self.planner)(args)
    }

    async fn execute(&self, args: &Arguments, backend: &dyn Backend) -> Result<String, ToolError> {
        let plan = self.plan(args)?;
        let body = backend.send(&plan.request).await?;
        Ok(plan.render(body))
    }
}

/// Name-indexed tool table, built once at startup.
pub struct ToolRegistry {
    tools: Vec<Tool>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Build a registry from `tools`, keeping declaration order. Names must
    /// be unique; a later duplicate shadows the earlier entry on lookup.
    pub fn new(tools: Vec<Tool>) -> Self {
        let by_name = tools
            .iter()
            .enumerate()
            .map(|(idx, tool)| (tool.name, idx))
            .collect();
        Self { tools, by_name }
    }

    /// The OpenCode tool set.
    pub fn builtin() -> Self {
        let mut tools = Vec::new();
        tools.extend(session::tools());
        tools.extend(message::tools());
        tools.extend(workspace::tools());
        tools.extend(file::tools());
        tools.extend(global::tools());
        Self::new(tools)
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.by_name.get(name).map(|&idx| &self.tools[idx])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter()
    }

    /// Descriptors in declaration order, as returned by `tools/list`.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(Tool::descriptor).collect()
    }

    /// Run the named tool against `backend`. Every failure, including an
    /// unknown name, comes back as an error result.
    pub async fn call(&self, name: &str, args: &Arguments, backend: &dyn Backend) -> ToolResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, "unknown tool");
            return ToolResult::error(format!("Unknown tool: {name}"));
        };

        match tool.execute(args, backend).await {
            Ok(text) => ToolResult::text(text),
            Err(err) => {
                tracing::warn!(
                    tool = name,
                    invalid_input = err.is_invalid_input(),
                    error = %err,
                    "tool call failed"
                );
                ToolResult::error(err.to_string())
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A required string argument. Absent, non-string and empty values are all
/// treated as missing.
pub fn required_str<'a>(args: &'a Arguments, key: &'static str) -> Result<&'a str, ToolError> {
    optional_str(args, key).ok_or(ToolError::MissingArgument(key))
}

/// A required argument used as one URL path segment.
pub fn required_segment<'a>(args: &'a Arguments, key: &'static str) -> Result<&'a str, ToolError> {
    let value = required_str(args, key)?;
    if is_dot_segment(value) {
        return Err(ToolError::DotSegment(key));
    }
    Ok(value)
}

/// A required `/`-separated path argument, split into segments. Empty
/// segments are dropped.
pub fn required_path<'a>(
    args: &'a Arguments,
    key: &'static str,
) -> Result<Vec<&'a str>, ToolError> {
    let segments: Vec<&str> = required_str(args, key)?
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    if segments.is_empty() {
        return Err(ToolError::MissingArgument(key));
    }
    if segments.iter().any(|s| is_dot_segment(s)) {
        return Err(ToolError::DotSegment(key));
    }
    Ok(segments)
}

/// An optional string argument; empty strings count as absent.
pub fn optional_str<'a>(args: &'a Arguments, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Input schema for an object whose properties are all strings.
pub fn string_object_schema(properties: &[(&str, &str)], required: &[&str]) -> Value {
    let props: Map<String, Value> = properties
        .iter()
        .map(|(name, description)| {
            (
                (*name).to_string(),
                serde_json::json!({ "type": "string", "description": description }),
            )
        })
        .collect();

    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}
