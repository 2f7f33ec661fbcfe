//! S3 object storage tools.

pub mod delete_object;
pub mod get_object;
pub mod list_buckets;
pub mod list_objects;
pub mod put_object;

pub use delete_object::DeleteObjectTool;
pub use get_object::GetObjectTool;
pub use list_buckets::ListBucketsTool;
pub use list_objects::ListObjectsTool;
pub use put_object::PutObjectTool;

use std::sync::Arc;

use crate::domains::adapters::S3Adapter;
use crate::domains::tools::ToolDefinition;

/// Every S3 tool, bound to one adapter.
pub fn definitions(adapter: Arc<S3Adapter>) -> Vec<ToolDefinition> {
    vec![
        ListBucketsTool::definition(adapter.clone()),
        ListObjectsTool::definition(adapter.clone()),
        GetObjectTool::definition(adapter.clone()),
        PutObjectTool::definition(adapter.clone()),
        DeleteObjectTool::definition(adapter),
    ]
}
