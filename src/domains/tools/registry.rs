//! Tool Registry - central registration and lookup for all tools.
//!
//! The registry is assembled once at startup through [`ToolRegistryBuilder`]
//! and is read-only afterwards. It is shared between the dispatcher and the
//! transports behind an `Arc`.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::handler::server::tool::schema_for_type;
use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use thiserror::Error;

use super::error::ToolError;
use super::handlers::ToolHandler;
use super::schema::{ParamSpec, input_schema};

/// Errors raised while assembling a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A tool with the same name was already registered.
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),
}

/// A named, schema-described tool and the handler that executes it.
#[derive(Clone)]
pub struct ToolDefinition {
    name: &'static str,
    description: &'static str,
    params: Vec<ParamSpec>,
    output_schema: Option<Arc<JsonObject>>,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: &'static str,
        description: &'static str,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name,
            description,
            params: Vec::new(),
            output_schema: None,
            handler,
        }
    }

    /// Append a parameter; declaration order is preserved.
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Advertise the structured result type of this tool.
    pub fn output<T: JsonSchema + 'static>(mut self) -> Self {
        self.output_schema = Some(Arc::new(schema_for_type::<T>()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        self.handler.clone()
    }

    /// Create a Tool model for this definition (metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.into(),
            description: Some(self.description.into()),
            input_schema: Arc::new(input_schema(&self.params)),
            annotations: None,
            output_schema: self.output_schema.clone(),
            icons: None,
            meta: None,
            title: None,
        }
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("params", &self.params.len())
            .finish()
    }
}

/// Collects tool definitions before the registry is frozen.
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<&'static str, ToolDefinition>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Rejects duplicate names.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<&mut Self, RegistryError> {
        if self.tools.contains_key(definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name.to_string()));
        }
        self.tools.insert(definition.name, definition);
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            tools: self.tools,
        }
    }
}

/// Immutable map from tool name to definition.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, ToolDefinition>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Look up a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&ToolDefinition, ToolError> {
        self.tools
            .get(name)
            .ok_or_else(|| ToolError::unknown_tool(name))
    }

    /// All definitions, ordered by name.
    pub fn definitions(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Get all tools as Tool models (metadata).
    pub fn to_tools(&self) -> Vec<Tool> {
        self.definitions().map(ToolDefinition::to_tool).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::handlers::Arguments;
    use crate::domains::tools::schema::ParamType;
    use async_trait::async_trait;

    struct NoopTool;

    #[async_trait]
    impl ToolHandler for NoopTool {
        async fn call(&self, _args: Arguments) -> Result<serde_json::Value, ToolError> {
            Ok(serde_json::json!({}))
        }
    }

    fn definition(name: &'static str) -> ToolDefinition {
        ToolDefinition::new(name, "test tool", Arc::new(NoopTool))
            .param(ParamSpec::required("bucket", ParamType::String, "Bucket"))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut builder = ToolRegistry::builder();
        builder.register(definition("list-buckets")).unwrap();
        builder.register(definition("get-object")).unwrap();
        let registry = builder.build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("get-object").unwrap().name(), "get-object");
        assert_eq!(registry.tool_names(), vec!["get-object", "list-buckets"]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut builder = ToolRegistry::builder();
        builder.register(definition("get-object")).unwrap();
        let err = builder.register(definition("get-object")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTool(ref name) if name == "get-object"));
    }

    #[test]
    fn test_lookup_unknown_tool() {
        let registry = ToolRegistry::builder().build();
        let err = registry.lookup("nope").unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref name) if name == "nope"));
    }

    #[test]
    fn test_to_tool_metadata() {
        let tool = definition("get-object").to_tool();
        assert_eq!(tool.name, "get-object");
        assert_eq!(tool.description.as_deref(), Some("test tool"));
        assert!(tool.input_schema.contains_key("properties"));
        assert!(tool.output_schema.is_none());
    }

    #[derive(schemars::JsonSchema)]
    #[allow(dead_code)]
    struct Listing {
        keys: Vec<String>,
    }

    #[test]
    fn test_output_schema_is_advertised() {
        let tool = definition("list-objects").output::<Listing>().to_tool();
        let schema = tool.output_schema.expect("output schema");
        assert!(schema.contains_key("properties"));
    }
}


