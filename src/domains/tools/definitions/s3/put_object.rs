//! Put object tool definition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::s3::{PutResult, S3Adapter, Upload};
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

const ENCODINGS: &[&str] = &["utf-8", "base64"];

// ============================================================================
// Tool Definition
// ============================================================================

/// Put object tool - writes an object to S3.
pub struct PutObjectTool {
    adapter: Arc<S3Adapter>,
}

impl PutObjectTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "put-object";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Write an object to S3, replacing any object with \
        the same key. Content is UTF-8 text unless encoding is base64.";

    pub fn definition(adapter: Arc<S3Adapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required("bucket", ParamType::String, "Bucket name"))
            .param(ParamSpec::required("key", ParamType::String, "Object key"))
            .param(ParamSpec::required("content", ParamType::String, "Object content"))
            .param(ParamSpec::optional(
                "content_type",
                ParamType::String,
                "MIME type of the content (default text/plain)",
            ))
            .param(
                ParamSpec::optional(
                    "encoding",
                    ParamType::String,
                    "How content is encoded (default utf-8)",
                )
                .one_of(ENCODINGS),
            )
            .output::<PutResult>()
    }
}

#[async_trait]
impl ToolHandler for PutObjectTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let result = self
            .adapter
            .put_object(Upload {
                bucket: args.str("bucket")?,
                key: args.str("key")?,
                content: args.str("content")?,
                content_type: args.opt_str("content_type")?,
                encoding: args.opt_str("encoding")?,
            })
            .await?;
        info!("Object written");
        payload(&result)
    }
}
