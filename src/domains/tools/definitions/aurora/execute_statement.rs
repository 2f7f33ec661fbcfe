//! Execute statement tool definition.
//!
//! Runs one SQL statement against the cluster through the RDS Data API and
//! returns the result set as named rows.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::AuroraAdapter;
use crate::domains::adapters::aurora::Statement;
use crate::domains::adapters::aurora::tabular::TabularResult;
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters shared by both statement tools.
pub(super) fn statement_params(definition: ToolDefinition) -> ToolDefinition {
    definition
        .param(ParamSpec::required("sql", ParamType::String, "SQL statement to execute"))
        .param(ParamSpec::optional(
            "database",
            ParamType::String,
            "Database name (defaults to the configured database)",
        ))
        .param(ParamSpec::optional(
            "parameters",
            ParamType::Any,
            "Named parameters referenced as :name in the SQL. Either an object of \
             name to value, or a list of {name, value} entries",
        ))
        .param(ParamSpec::optional(
            "continue_after_timeout",
            ParamType::Boolean,
            "Keep running the statement after the call times out (default false)",
        ))
}

/// Read the statement from validated arguments.
pub(super) fn statement<'a>(
    args: &'a Arguments,
    transaction_id: Option<&'a str>,
) -> Result<Statement<'a>, ToolError> {
    Ok(Statement {
        sql: args.str("sql")?,
        database: args.opt_str("database")?,
        parameters: args.get("parameters"),
        continue_after_timeout: args.opt_bool("continue_after_timeout")?.unwrap_or(false),
        transaction_id,
    })
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Execute statement tool - runs SQL outside of any transaction.
pub struct ExecuteStatementTool {
    adapter: Arc<AuroraAdapter>,
}

impl ExecuteStatementTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "execute-statement";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Execute a SQL statement on the Aurora PostgreSQL \
        cluster. Returns column names, rows as objects keyed by column, and the row count \
        (rows returned, or rows affected for statements without a result set).";

    pub fn definition(adapter: Arc<AuroraAdapter>) -> ToolDefinition {
        statement_params(ToolDefinition::new(
            Self::NAME,
            Self::DESCRIPTION,
            Arc::new(Self { adapter }),
        ))
        .output::<TabularResult>()
    }
}

#[async_trait]
impl ToolHandler for ExecuteStatementTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let result = self.adapter.execute(statement(&args, None)?).await?;
        info!(rows = result.row_count, "Statement executed");
        payload(&result)
    }
}
