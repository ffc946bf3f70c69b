//! Docbase MCP Server
//!
//! Entry point for the docbase-mcp binary.
//! Supports stdio, TCP and HTTP transports.

use clap::Parser;
use docbase_mcp::{create_registry, create_server_with_tools, validate_registry};
use docbase_mcp_common::config::ServerConfig;
use docbase_mcp_common::error::Result;
use docbase_mcp_common::Transport;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "docbase-mcp")]
#[command(about = "Docbase MCP Server - document CRUD over a hosted Supabase table")]
#[command(version)]
struct Args {
    /// Transport mode: "stdio", "tcp" or "http"
    #[arg(short, long, default_value = "stdio")]
    transport: String,

    /// Port override (only used for tcp/http transports)
    #[arg(short, long)]
    port: Option<u16>,

    /// Optional TOML config file; store credentials fall back to the
    /// SUPABASE_URL / SUPABASE_SERVICE_ROLE_KEY environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate registry and exit (for CI)
    #[arg(long)]
    validate_registry: bool,

    /// Show tool list and exit
    #[arg(long)]
    show_tools: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logging MUST use stderr for stdio transport (stdout is for JSON-RPC)
    let is_stdio = args.transport == "stdio";
    if is_stdio {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .with(EnvFilter::from_default_env().add_directive("docbase=info".parse().unwrap()))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env().add_directive("docbase=info".parse().unwrap()))
            .init();
    }

    if args.validate_registry {
        info!("Validating docbase-mcp registry...");
        let registry = create_registry()?;
        validate_registry(&registry)?;
        println!(
            "Registry valid: {} tools (max {})",
            registry.len(),
            docbase_mcp_common::MAX_TOOLS_PER_SERVER
        );
        return Ok(());
    }

    if args.show_tools {
        let registry = create_registry()?;
        println!("docbase-mcp tools ({}):", registry.len());
        let mut categories = registry.categories();
        categories.sort_unstable();
        for cat in categories {
            let tools = registry.by_category(cat);
            println!("\n  {} ({}):", cat, tools.len());
            for tool in tools {
                println!("    - {}: {}", tool.name, tool.description);
            }
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::docs(),
    };

    // Missing store credentials are startup-fatal, reported once
    let config = config.with_store_from_env().map_err(|e| {
        error!("{}", e);
        e
    })?;

    let transport = match args.transport.as_str() {
        "tcp" => Transport::Tcp(args.port.unwrap_or(config.tcp_port)),
        "http" => Transport::Http(args.port.unwrap_or(config.http_port)),
        _ => Transport::Stdio,
    };

    let server = create_server_with_tools(config).await?;

    info!(
        "Starting docbase-mcp on {}",
        match transport {
            Transport::Stdio => "stdio".to_string(),
            Transport::Tcp(p) => format!("tcp:{}", p),
            Transport::Http(p) => format!("http:{}", p),
        }
    );

    server.serve(transport).await
}
