//! Aurora PostgreSQL tools, backed by the RDS Data API.

pub mod begin_transaction;
pub mod commit_transaction;
pub mod execute_statement;
pub mod execute_statement_with_transaction;
pub mod rollback_transaction;

pub use begin_transaction::BeginTransactionTool;
pub use commit_transaction::CommitTransactionTool;
pub use execute_statement::ExecuteStatementTool;
pub use execute_statement_with_transaction::ExecuteStatementWithTransactionTool;
pub use rollback_transaction::RollbackTransactionTool;

use std::sync::Arc;

use crate::domains::adapters::AuroraAdapter;
use crate::domains::tools::ToolDefinition;

/// Every Aurora tool, bound to one adapter.
pub fn definitions(adapter: Arc<AuroraAdapter>) -> Vec<ToolDefinition> {
    vec![
        ExecuteStatementTool::definition(adapter.clone()),
        ExecuteStatementWithTransactionTool::definition(adapter.clone()),
        BeginTransactionTool::definition(adapter.clone()),
        CommitTransactionTool::definition(adapter.clone()),
        RollbackTransactionTool::definition(adapter),
    ]
}
