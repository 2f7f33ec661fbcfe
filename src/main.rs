//! MCP Server Entry Point
//!
//! Serves one AWS service per process. The service comes from the first
//! command-line argument, falling back to `MCP_SERVICE`:
//!
//! ```text
//! aws_mcp_servers s3
//! MCP_SERVICE=aurora aws_mcp_servers
//! ```

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use aws_mcp_servers::core::{Config, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from environment
    let mut config = Config::from_env();
    if let Some(service) = std::env::args().nth(1) {
        config = config.with_service(service);
    }

    // Initialize logging
    init_logging(&config.logging.level);

    let server = McpServer::for_service(&config)
        .await
        .context("failed to start MCP server")?;

    info!(
        service = %server.service(),
        "Starting {} v{}",
        server.name(),
        server.version()
    );

    // Create and run the transport service
    let transport = TransportService::new(config.transport.clone());
    transport.run(server).await?;

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout carries the protocol in STDIO mode.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
