//! List objects tool definition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::s3::{ObjectListing, S3Adapter};
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

// ============================================================================
// Tool Definition
// ============================================================================

/// List objects tool - lists the objects of a bucket, optionally under a prefix.
pub struct ListObjectsTool {
    adapter: Arc<S3Adapter>,
}

impl ListObjectsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "list-objects";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "List objects in an S3 bucket. Returns key, size, \
        last modification time and ETag for up to max_keys objects (1-1000, default 1000) \
        and whether more objects match.";

    pub fn definition(adapter: Arc<S3Adapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required("bucket", ParamType::String, "Bucket name"))
            .param(ParamSpec::optional(
                "prefix",
                ParamType::String,
                "Only list keys starting with this prefix",
            ))
            .param(ParamSpec::optional(
                "max_keys",
                ParamType::Integer,
                "Maximum number of objects to return (1-1000, default 1000)",
            ))
            .output::<ObjectListing>()
    }
}

#[async_trait]
impl ToolHandler for ListObjectsTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let result = self
            .adapter
            .list_objects(args.str("bucket")?, args.opt_str("prefix")?, args.opt_i64("max_keys")?)
            .await?;
        info!(
            count = result.objects.len(),
            truncated = result.truncated,
            "Listed objects"
        );
        payload(&result)
    }
}
