//! Tools domain module.
//!
//! Tools are the named operations a server exposes to MCP clients. This module
//! holds the protocol core shared by every backend:
//!
//! - `value.rs` - closed value type for arguments and results
//! - `schema.rs` - parameter specs and JSON input schemas
//! - `registry.rs` - immutable registry of tool definitions
//! - `validator.rs` - argument validation and coercion
//! - `dispatcher.rs` - per-call deadline, panic containment and error mapping
//! - `error.rs` - the closed error taxonomy surfaced to clients
//! - `definitions/` - individual tool implementations (one file per tool)
//! - `catalog.rs` - the registry each backend service is served with
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/<service>/` with `NAME`,
//!    `DESCRIPTION` and a `definition()` constructor
//! 2. Implement [`ToolHandler`] for the tool's handler struct
//! 3. Register the definition in `catalog.rs`

pub mod catalog;
pub mod definitions;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod schema;
pub mod validator;
pub mod value;

pub use catalog::{Backend, build_registry};
pub use dispatcher::{Dispatcher, Outcome, ToolRequest, ToolResult};
pub use error::{
    BackendClass, ErrorDescriptor, ErrorKind, ToolError, TransactionState, Violation,
};
pub use handlers::{Arguments, ToolHandler, payload};
pub use registry::{RegistryError, ToolDefinition, ToolRegistry, ToolRegistryBuilder};
pub use schema::{ParamSpec, ParamType};
pub use value::{Value, ValueKind};
