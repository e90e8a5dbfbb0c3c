use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::client::{ApiClient, ClientError};
use crate::config::{ClientConfig, ConfigError, Overrides};
use crate::schema;
use crate::server::{McpServer, ServerError};

#[derive(Parser, Debug)]
#[command(name = "oho", bin_name = "oho", version)]
#[command(about = "Command-line client for the OpenCode Server")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// JSON config file [default: <config dir>/oho/config.json]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Connection flags. They override the config file and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Server host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true)]
    pub port: Option<u16>,

    /// Basic-auth username
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Server password (enables basic auth)
    #[arg(long, global = true)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an MCP server on stdio exposing the OpenCode API as tools.
    #[command(name = "mcpserver")]
    McpServer,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("client error: {0}")]
    Client(#[from] ClientError),
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}

/// Install the stderr subscriber. stdout belongs to the JSON-RPC stream.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "oho=debug" } else { "oho=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run_command(cli: &Cli) -> Result<(), CliError> {
    let config = ClientConfig::load(cli.config.as_deref(), &cli.connection.overrides())?;
    match cli.command {
        Command::McpServer => run_mcp_server(&config).await,
    }
}

async fn run_mcp_server(config: &ClientConfig) -> Result<(), CliError> {
    let client = ApiClient::new(config)?;
    tracing::info!(
        server = %client.base_url(),
        basic_auth = config.credentials().is_some(),
        "starting MCP bridge"
    );

    let mut server = McpServer::new(Arc::new(client));
    for tool in server.registry().iter() {
        if let Err(e) = schema::check_input_schema(&tool.input_schema) {
            tracing::warn!(tool = tool.name, error = %e, "tool input schema does not compile");
        }
    }

    server.run().await?;
    tracing::info!("MCP bridge stopped");
    Ok(())
}
