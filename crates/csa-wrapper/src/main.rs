//! CSA hybrid wrapper
//!
//! Hosts the `invoke_csa_agent` tool outside an agent framework: forward a
//! single message, answer a tool call read from stdin, or print the router
//! agent manifest. Only replies go to stdout; logs go to stderr.

mod agent;
mod config;
mod error;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use csa_tools::{InvokeCsaAgentTool, ToolCall, ToolExecutor};

use crate::config::{CredentialSource, Overrides, WrapperConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// URL of the CSA agent service, also used as the token audience
    #[arg(long, env = "CSA_AGENT_URL", global = true)]
    agent_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CSA_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Where identity tokens come from
    #[arg(long, env = "CSA_CREDENTIALS", value_enum, global = true)]
    credentials: Option<CredentialSource>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Forward one message to the CSA agent and print its reply
    Invoke {
        /// The user's original message
        #[arg(long)]
        user_input: String,

        /// The unique ID for the conversation
        #[arg(long)]
        thread_id: String,
    },
    /// Read a tool call as JSON from stdin and print the tool's result
    Call,
    /// Print the router agent manifest as JSON
    Manifest,
}

/// Initializes structured logging with tracing.
///
/// Supports two output formats via `CSA_LOG_FORMAT` environment variable:
/// - `json`: Machine-readable JSON logs
/// - `pretty`: Human-readable formatted logs (default)
///
/// Log level is controlled via `RUST_LOG` environment variable.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("CSA_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("csa_wrapper=info,csa_forwarder=info,csa_tools=info")
    });

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn build_executor(config: &WrapperConfig) -> Result<ToolExecutor> {
    let forwarder = config
        .build_forwarder(env_lookup)
        .context("Failed to set up the CSA forwarder")?;
    debug!("Built forwarder: {forwarder:?}");

    let mut executor = ToolExecutor::new();
    executor.add_tool(InvokeCsaAgentTool::new(forwarder));
    Ok(executor)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let mut config = WrapperConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply_overrides(Overrides {
        agent_url: args.agent_url,
        timeout_secs: args.timeout_secs,
        credentials: args.credentials,
    });
    config.validate().context("Invalid configuration")?;

    match args.command {
        Command::Invoke {
            user_input,
            thread_id,
        } => {
            let forwarder = config
                .build_forwarder(env_lookup)
                .context("Failed to set up the CSA forwarder")?;
            let reply = forwarder.relay(&user_input, &thread_id).await;
            println!("{reply}");
        }
        Command::Call => {
            let executor = build_executor(&config)?;

            let mut input = String::new();
            tokio::io::stdin()
                .read_to_string(&mut input)
                .await
                .context("Failed to read tool call from stdin")?;
            let call: ToolCall =
                serde_json::from_str(&input).context("Failed to parse tool call JSON")?;

            info!("Received tool call for '{}'", call.function.name);
            let result = executor.execute_tool(&call).await?;
            println!("{result}");
        }
        Command::Manifest => {
            let executor = build_executor(&config)?;
            let manifest =
                agent::router_manifest(config.agent_url.as_deref(), executor.get_all_tools())?;
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
    }

    Ok(())
}
