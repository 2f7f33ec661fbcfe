//! Get place tool definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domains::adapters::LocationAdapter;
use crate::domains::adapters::location::Place;
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

/// Get place tool - looks up a place by the identifier search-places returned.
pub struct GetPlaceTool {
    adapter: Arc<LocationAdapter>,
}

impl GetPlaceTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get-place";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Get the details of a place by the placeId returned from search-places.";

    pub fn definition(adapter: Arc<LocationAdapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required("place_id", ParamType::String, "Place identifier"))
            .output::<Place>()
    }
}

#[async_trait]
impl ToolHandler for GetPlaceTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let place = self.adapter.get_place(args.str("place_id")?).await?;
        payload(&place)
    }
}
