//! AWS MCP Servers Library
//!
//! Model Context Protocol servers that expose Amazon S3, Aurora PostgreSQL
//! (through the RDS Data API) and Amazon Location Service as tools. One
//! process serves one service.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server and transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: tool registry, argument validation, dispatch and the
//!     per-service tool definitions
//!   - **adapters**: calls against the AWS APIs, with retry and failure
//!     classification
//!
//! # Example
//!
//! ```rust,no_run
//! use aws_mcp_servers::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env().with_service("s3");
//!     let server = McpServer::for_service(&config).await?;
//!     TransportService::new(config.transport.clone()).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
