//! Command-line client for the OpenCode Server HTTP API.
//!
//! The `mcpserver` command runs an MCP bridge: newline-delimited JSON-RPC 2.0
//! on stdio, with a fixed set of tools that each map to one OpenCode Server
//! endpoint and pass the response body through verbatim.

pub mod cli;
pub mod client;
pub mod config;
pub mod handlers;
pub mod protocol;
pub mod server;

pub mod schema;
