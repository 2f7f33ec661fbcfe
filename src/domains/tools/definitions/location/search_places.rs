//! Search places tool definition.
//!
//! Free-text geocoding against the configured place index. Results can be
//! biased towards a position and filtered to a set of countries.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::LocationAdapter;
use crate::domains::adapters::location::{PlaceList, Search};
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

// ============================================================================
// Tool Definition
// ============================================================================

/// Search places tool - finds places matching a free-text query.
pub struct SearchPlacesTool {
    adapter: Arc<LocationAdapter>,
}

impl SearchPlacesTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search-places";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Search for places by free text such as an address, \
        landmark or business name. Returns up to max_results places (1-50, default 10) \
        with their [longitude, latitude] position.";

    pub fn definition(adapter: Arc<LocationAdapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required("text", ParamType::String, "Text to search for"))
            .param(ParamSpec::optional(
                "max_results",
                ParamType::Integer,
                "Maximum number of places to return (1-50, default 10)",
            ))
            .param(ParamSpec::optional(
                "bias_position",
                ParamType::NumberArray,
                "Prefer results near this [longitude, latitude]",
            ))
            .param(ParamSpec::optional(
                "countries",
                ParamType::StringArray,
                "Only return places in these ISO 3166 alpha-3 country codes",
            ))
            .output::<PlaceList>()
    }
}

#[async_trait]
impl ToolHandler for SearchPlacesTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let result = self
            .adapter
            .search_places(Search {
                text: args.str("text")?,
                max_results: args.opt_i64("max_results")?,
                bias_position: args.opt_list("bias_position")?,
                countries: args.opt_list("countries")?,
            })
            .await?;
        info!(count = result.places.len(), "Places found");
        payload(&result)
    }
}
