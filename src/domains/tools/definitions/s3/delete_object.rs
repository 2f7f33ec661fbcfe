//! Delete object tool definition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::s3::{DeleteResult, S3Adapter};
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

// ============================================================================
// Tool Definition
// ============================================================================

/// Delete object tool - removes an object from S3.
pub struct DeleteObjectTool {
    adapter: Arc<S3Adapter>,
}

impl DeleteObjectTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "delete-object";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Delete an object from S3. On versioned buckets this \
        places a delete marker.";

    pub fn definition(adapter: Arc<S3Adapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required("bucket", ParamType::String, "Bucket name"))
            .param(ParamSpec::required("key", ParamType::String, "Object key"))
            .output::<DeleteResult>()
    }
}

#[async_trait]
impl ToolHandler for DeleteObjectTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let result = self
            .adapter
            .delete_object(args.str("bucket")?, args.str("key")?)
            .await?;
        info!("Object deleted");
        payload(&result)
    }
}
