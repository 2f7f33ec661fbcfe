//! Begin transaction tool definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domains::adapters::AuroraAdapter;
use crate::domains::adapters::aurora::TransactionStarted;
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

/// Begin transaction tool - opens a Data API transaction.
pub struct BeginTransactionTool {
    adapter: Arc<AuroraAdapter>,
}

impl BeginTransactionTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "begin-transaction";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Start a transaction and return its identifier. \
        The transaction is rolled back by the service if left idle for three minutes.";

    pub fn definition(adapter: Arc<AuroraAdapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::optional(
                "database",
                ParamType::String,
                "Database name (defaults to the configured database)",
            ))
            .output::<TransactionStarted>()
    }
}

#[async_trait]
impl ToolHandler for BeginTransactionTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let started = self.adapter.begin(args.opt_str("database")?).await?;
        payload(&started)
    }
}
