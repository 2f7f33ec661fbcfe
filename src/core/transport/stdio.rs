//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! Stops when the client closes stdin or on a shutdown signal.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;
use crate::core::shutdown::shutdown_signal;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let service = server
            .clone()
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;
        let cancel = service.cancellation_token();

        tokio::select! {
            result = service.waiting() => {
                result.map_err(|e| TransportError::ServiceError(e.to_string()))?;
                info!("Client closed stdin");
            }
            _ = shutdown_signal() => {
                cancel.cancel();
            }
        }

        server.drain().await;
        info!("STDIO transport finished");
        Ok(())
    }
}
