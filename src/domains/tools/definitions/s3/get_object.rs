//! Get object tool definition.
//!
//! Reads an object, or a byte range of it. Text comes back verbatim; any
//! content that is not valid UTF-8 is base64-encoded and flagged as such.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::s3::{ObjectContent, S3Adapter};
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

// ============================================================================
// Tool Definition
// ============================================================================

/// Get object tool - reads the content of an S3 object.
pub struct GetObjectTool {
    adapter: Arc<S3Adapter>,
}

impl GetObjectTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get-object";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Read an object from S3. Optionally read only the \
        inclusive byte range range_start..range_end. UTF-8 content is returned as text, \
        anything else base64-encoded (see the encoding field).";

    pub fn definition(adapter: Arc<S3Adapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required("bucket", ParamType::String, "Bucket name"))
            .param(ParamSpec::required("key", ParamType::String, "Object key"))
            .param(ParamSpec::optional(
                "range_start",
                ParamType::Integer,
                "First byte to read (0-based)",
            ))
            .param(ParamSpec::optional(
                "range_end",
                ParamType::Integer,
                "Last byte to read (inclusive); requires range_start",
            ))
            .output::<ObjectContent>()
    }
}

#[async_trait]
impl ToolHandler for GetObjectTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let result = self
            .adapter
            .get_object(
                args.str("bucket")?,
                args.str("key")?,
                args.opt_i64("range_start")?,
                args.opt_i64("range_end")?,
            )
            .await?;
        info!(bytes = result.content_length, "Object read");
        payload(&result)
    }
}
