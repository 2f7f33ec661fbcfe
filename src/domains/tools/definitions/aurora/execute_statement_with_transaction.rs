//! Execute statement within a transaction tool definition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::execute_statement::{statement, statement_params};
use crate::domains::adapters::AuroraAdapter;
use crate::domains::adapters::aurora::tabular::TabularResult;
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

/// Execute statement tool bound to an open transaction.
pub struct ExecuteStatementWithTransactionTool {
    adapter: Arc<AuroraAdapter>,
}

impl ExecuteStatementWithTransactionTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "execute-statement-with-transaction";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Execute a SQL statement inside a transaction opened \
        with begin-transaction. Changes become visible once the transaction is committed.";

    pub fn definition(adapter: Arc<AuroraAdapter>) -> ToolDefinition {
        statement_params(
            ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter })).param(
                ParamSpec::required(
                    "transaction_id",
                    ParamType::String,
                    "Identifier returned by begin-transaction",
                ),
            ),
        )
        .output::<TabularResult>()
    }
}

#[async_trait]
impl ToolHandler for ExecuteStatementWithTransactionTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let transaction_id = args.str("transaction_id")?;
        let result = self
            .adapter
            .execute(statement(&args, Some(transaction_id))?)
            .await?;
        info!(rows = result.row_count, "Statement executed in transaction");
        payload(&result)
    }
}
