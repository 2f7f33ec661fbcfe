//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] serves the tools of exactly one AWS service. It owns the
//! [`Dispatcher`], and both the rmcp handler (stdio, TCP) and the HTTP
//! transport route every tool call through it.
//!
//! Tools are defined in `domains/tools/definitions/`, one file per tool, and
//! grouped per service in `domains/tools/catalog.rs`.
//! **Adding a new tool does NOT require modifying this file!**

use std::sync::Arc;
use std::time::Duration;

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use tracing::{info, instrument, warn};

use super::config::{Config, ServiceKind};
use super::error::Result;
use crate::domains::adapters::aurora::RdsDataConnector;
use crate::domains::adapters::location::LocationConnector;
use crate::domains::adapters::s3::S3Connector;
use crate::domains::adapters::{
    AdapterSession, AuroraAdapter, DataApi, LocationAdapter, ObjectStore, PlaceService,
    RetryPolicy, S3Adapter,
};
use crate::domains::tools::{Backend, Dispatcher, ToolRequest, ToolResult, build_registry};

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    name: String,
    version: String,
    service: ServiceKind,
    dispatcher: Dispatcher,
    shutdown_grace: Duration,
}

impl McpServer {
    /// Create a server for an already-connected backend.
    pub fn new(config: &Config, backend: Backend) -> Result<Self> {
        let service = backend.service();
        let registry = Arc::new(build_registry(&backend)?);
        info!(service = %service, tools = registry.len(), "Tool registry built");

        Ok(Self {
            name: config.server_name(service),
            version: config.server.version.clone(),
            service,
            dispatcher: Dispatcher::new(registry, config.dispatch.call_timeout()),
            shutdown_grace: config.dispatch.shutdown_grace(),
        })
    }

    /// Validate the configuration and connect to the selected service.
    pub async fn for_service(config: &Config) -> Result<Self> {
        let service = config.validate()?;
        let policy = RetryPolicy::from(&config.retry);

        let backend = match service {
            ServiceKind::S3 => {
                let session = AdapterSession::<dyn ObjectStore>::connect(Arc::new(
                    S3Connector::new(config.aws.clone()),
                ))
                .await?;
                Backend::S3(Arc::new(S3Adapter::new(session, policy)))
            }
            ServiceKind::Aurora => {
                let session = AdapterSession::<dyn DataApi>::connect(Arc::new(
                    RdsDataConnector::new(config.aws.clone(), config.aurora.clone()),
                ))
                .await?;
                Backend::Aurora(Arc::new(AuroraAdapter::new(
                    session,
                    policy,
                    config.aurora.database.clone(),
                )))
            }
            ServiceKind::Location => {
                let session = AdapterSession::<dyn PlaceService>::connect(Arc::new(
                    LocationConnector::new(config.aws.clone(), config.location.clone()),
                ))
                .await?;
                Backend::Location(Arc::new(LocationAdapter::new(session, policy)))
            }
        };

        Self::new(config, backend)
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn service(&self) -> ServiceKind {
        self.service
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn instructions(&self) -> String {
        let summary = match self.service {
            ServiceKind::S3 => "List, read, write and delete objects in Amazon S3 buckets.",
            ServiceKind::Aurora => {
                "Run SQL against an Aurora PostgreSQL cluster through the RDS Data API, \
                 optionally inside explicit transactions."
            }
            ServiceKind::Location => {
                "Search places and calculate routes with Amazon Location Service."
            }
        };
        format!("{summary} Failed calls return an error object with a kind and a retryable flag.")
    }

    /// All tools of this server, as MCP tool descriptions.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.dispatcher.registry().to_tools()
    }

    /// Dispatch one tool call.
    pub async fn call_tool(
        &self,
        id: serde_json::Value,
        name: &str,
        arguments: Option<serde_json::Value>,
    ) -> ToolResult {
        self.dispatcher
            .dispatch(ToolRequest::from_json(id, name, arguments))
            .await
    }

    /// Wait for in-flight calls to finish, up to the configured grace period.
    pub async fn drain(&self) {
        let in_flight = self.dispatcher.in_flight();
        let pending = in_flight.count();
        if pending == 0 {
            return;
        }
        info!(pending, "Waiting for in-flight tool calls");
        if !in_flight.drain(self.shutdown_grace).await {
            warn!(
                abandoned = in_flight.count(),
                "Shutdown grace period elapsed, abandoning tool calls"
            );
        }
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                ..Implementation::from_build_env()
            },
            instructions: Some(self.instructions()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    #[instrument(skip_all)]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.list_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let id = serde_json::to_value(&context.id).unwrap_or(serde_json::Value::Null);
        let arguments = request.arguments.map(serde_json::Value::Object);
        let result = self.call_tool(id, &request.name, arguments).await;
        Ok(result.into_call_tool_result())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Servers wired to in-memory backends.

    use super::*;
    use crate::domains::adapters::aurora::fake::FakeDataApi;
    use crate::domains::adapters::s3::fake::FakeObjectStore;

    pub fn s3_server(store: Arc<FakeObjectStore>) -> McpServer {
        let adapter = S3Adapter::new(
            AdapterSession::<dyn ObjectStore>::new(store),
            RetryPolicy::immediate(3),
        );
        McpServer::new(&Config::default(), Backend::S3(Arc::new(adapter))).unwrap()
    }

    pub fn aurora_server(api: Arc<FakeDataApi>) -> McpServer {
        let adapter = AuroraAdapter::new(
            AdapterSession::<dyn DataApi>::new(api),
            RetryPolicy::immediate(3),
            "postgres",
        );
        McpServer::new(&Config::default(), Backend::Aurora(Arc::new(adapter))).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::domains::adapters::aurora::fake::FakeDataApi;
    use crate::domains::adapters::s3::fake::FakeObjectStore;
    use serde_json::json;

    #[test]
    fn test_default_name_follows_service() {
        let server = aurora_server(Arc::new(FakeDataApi::default()));
        assert_eq!(server.name(), "aurora-postgres-mcp-server");
        assert_eq!(server.service(), ServiceKind::Aurora);
        assert!(server.instructions().contains("Aurora"));
    }

    #[test]
    fn test_configured_name_wins() {
        let mut config = Config::default();
        config.server.name = Some("storage".to_string());
        let adapter = S3Adapter::new(
            AdapterSession::<dyn ObjectStore>::new(Arc::new(FakeObjectStore::default())),
            RetryPolicy::immediate(1),
        );
        let server = McpServer::new(&config, Backend::S3(Arc::new(adapter))).unwrap();
        assert_eq!(server.name(), "storage");
    }

    #[test]
    fn test_server_info_advertises_tools_only() {
        let server = s3_server(Arc::new(FakeObjectStore::default()));
        let info = server.get_info();
        assert_eq!(info.server_info.name, "s3-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
    }

    #[test]
    fn test_list_tools() {
        let server = s3_server(Arc::new(FakeObjectStore::default()));
        let names: Vec<String> = server
            .list_tools()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"get-object".to_string()));
    }

    #[tokio::test]
    async fn test_call_tool_echoes_correlation_token() {
        let server = s3_server(Arc::new(FakeObjectStore::with_bucket("b")));
        let result = server.call_tool(json!("req-7"), "list-buckets", None).await;
        assert_eq!(result.id, json!("req-7"));
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_drain_returns_when_idle() {
        let server = s3_server(Arc::new(FakeObjectStore::default()));
        server.drain().await;
        assert_eq!(server.dispatcher().in_flight().count(), 0);
    }
}
