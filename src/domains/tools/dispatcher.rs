//! Tool dispatcher.
//!
//! Turns a [`ToolRequest`] into exactly one [`ToolResult`]:
//!
//! 1. look the tool up in the registry;
//! 2. validate and coerce the arguments;
//! 3. run the handler on its own task under a fresh deadline;
//! 4. map every failure (including panics and deadline expiry) into the
//!    closed error taxonomy.
//!
//! Argument values are never logged; they may hold SQL literals, object
//! content or identifiers the operator considers sensitive.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rmcp::model::{CallToolResult, Content};
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::error::{ErrorDescriptor, ToolError, Violation};
use super::registry::ToolRegistry;
use super::validator::validate;
use super::value::Value;
use crate::core::shutdown::InFlight;

/// A single incoming tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    /// Opaque correlation token, echoed back in the result.
    pub id: serde_json::Value,
    pub tool: String,
    pub arguments: Value,
}

impl ToolRequest {
    pub fn new(id: serde_json::Value, tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            id,
            tool: tool.into(),
            arguments,
        }
    }

    /// Build a request from JSON-RPC `tools/call` parameters.
    pub fn from_json(
        id: serde_json::Value,
        tool: impl Into<String>,
        arguments: Option<serde_json::Value>,
    ) -> Self {
        Self::new(
            id,
            tool,
            arguments.map(Value::from_json).unwrap_or(Value::Null),
        )
    }
}

/// Success payload or error descriptor of a call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success(serde_json::Value),
    Error(ErrorDescriptor),
}

/// The answer to exactly one [`ToolRequest`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub id: serde_json::Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ToolResult {
    pub fn new(id: serde_json::Value, outcome: Result<serde_json::Value, ToolError>) -> Self {
        let outcome = match outcome {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => Outcome::Error(err.descriptor()),
        };
        Self { id, outcome }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn error(&self) -> Option<&ErrorDescriptor> {
        match &self.outcome {
            Outcome::Error(descriptor) => Some(descriptor),
            Outcome::Success(_) => None,
        }
    }

    pub fn payload(&self) -> Option<&serde_json::Value> {
        match &self.outcome {
            Outcome::Success(payload) => Some(payload),
            Outcome::Error(_) => None,
        }
    }

    /// Render as an MCP `CallToolResult`: structured content plus a text copy.
    pub fn into_call_tool_result(self) -> CallToolResult {
        match self.outcome {
            Outcome::Success(payload) => CallToolResult {
                content: vec![Content::text(payload.to_string())],
                structured_content: Some(payload),
                is_error: Some(false),
                meta: None,
            },
            Outcome::Error(descriptor) => {
                let structured = serde_json::json!({ "error": descriptor });
                CallToolResult {
                    content: vec![Content::text(descriptor.message)],
                    structured_content: Some(structured),
                    is_error: Some(true),
                    meta: None,
                }
            }
        }
    }
}

/// Routes validated requests to their handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    call_timeout: Duration,
    in_flight: InFlight,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
            in_flight: InFlight::new(),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Calls currently executing, for graceful shutdown.
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Dispatch one request. Never fails: errors become the result's outcome.
    #[instrument(skip_all, fields(tool = %request.tool, id = %request.id))]
    pub async fn dispatch(&self, request: ToolRequest) -> ToolResult {
        let ToolRequest {
            id,
            tool,
            arguments,
        } = request;
        let started = Instant::now();

        let outcome = self.run(&tool, arguments).await;

        let latency_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => info!(latency_ms, "Tool call succeeded"),
            Err(err) => warn!(
                kind = err.kind().as_str(),
                retryable = err.retryable(),
                latency_ms,
                "Tool call failed"
            ),
        }

        ToolResult::new(id, outcome)
    }

    async fn run(&self, tool: &str, arguments: Value) -> Result<serde_json::Value, ToolError> {
        let definition = self.registry.lookup(tool)?;

        let arguments = match arguments {
            Value::Map(map) => map,
            Value::Null => BTreeMap::new(),
            other => {
                return Err(ToolError::validation(
                    "arguments",
                    Violation::WrongType {
                        expected: "object".to_string(),
                        found: other.kind().to_string(),
                    },
                ));
            }
        };
        let arguments = validate(arguments, definition)?;

        let handler = definition.handler();
        let guard = self.in_flight.enter();
        let mut task = tokio::spawn(async move {
            let _guard = guard;
            handler.call(arguments).await
        });

        match tokio::time::timeout(self.call_timeout, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => {
                Err(ToolError::internal("tool handler panicked"))
            }
            Ok(Err(_)) => Err(ToolError::internal("tool handler was cancelled")),
            Err(_elapsed) => {
                task.abort();
                Err(ToolError::Timeout {
                    after_ms: self.call_timeout.as_millis() as u64,
                })
            }
        }
    }
}
