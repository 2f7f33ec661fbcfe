//! Tool definitions module.
//!
//! One submodule per service; each tool is defined in its own file.

pub mod aurora;
pub mod location;
pub mod s3;

pub use aurora::{
    BeginTransactionTool, CommitTransactionTool, ExecuteStatementTool,
    ExecuteStatementWithTransactionTool, RollbackTransactionTool,
};
pub use location::{CalculateRouteTool, GetPlaceTool, SearchPlacesTool};
pub use s3::{DeleteObjectTool, GetObjectTool, ListBucketsTool, ListObjectsTool, PutObjectTool};
