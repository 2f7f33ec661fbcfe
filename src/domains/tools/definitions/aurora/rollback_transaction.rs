//! Rollback transaction tool definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domains::adapters::AuroraAdapter;
use crate::domains::adapters::aurora::TransactionEnded;
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

pub struct RollbackTransactionTool {
    adapter: Arc<AuroraAdapter>,
}

impl RollbackTransactionTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "rollback-transaction";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Roll back a transaction opened with begin-transaction, discarding its changes.";

    pub fn definition(adapter: Arc<AuroraAdapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required(
                "transaction_id",
                ParamType::String,
                "Identifier returned by begin-transaction",
            ))
            .output::<TransactionEnded>()
    }
}

#[async_trait]
impl ToolHandler for RollbackTransactionTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let ended = self.adapter.rollback(args.str("transaction_id")?).await?;
        payload(&ended)
    }
}
