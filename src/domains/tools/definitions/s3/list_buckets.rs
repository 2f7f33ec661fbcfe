//! List buckets tool definition.
//!
//! Lists every bucket visible to the server's credentials.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::s3::{BucketList, S3Adapter};
use crate::domains::tools::{Arguments, ToolDefinition, ToolError, ToolHandler, payload};

// ============================================================================
// Tool Definition
// ============================================================================

/// List buckets tool - lists all S3 buckets.
pub struct ListBucketsTool {
    adapter: Arc<S3Adapter>,
}

impl ListBucketsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "list-buckets";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "List all S3 buckets in the account with their creation dates.";

    pub fn definition(adapter: Arc<S3Adapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .output::<BucketList>()
    }
}

#[async_trait]
impl ToolHandler for ListBucketsTool {
    async fn call(&self, _args: Arguments) -> Result<serde_json::Value, ToolError> {
        let result = self.adapter.list_buckets().await?;
        info!(count = result.buckets.len(), "Listed buckets");
        payload(&result)
    }
}
