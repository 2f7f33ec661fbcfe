//! Calculate route tool definition.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domains::adapters::LocationAdapter;
use crate::domains::adapters::location::{DISTANCE_UNITS, Directions, Route, TRAVEL_MODES};
use crate::domains::tools::{
    Arguments, ParamSpec, ParamType, ToolDefinition, ToolError, ToolHandler, payload,
};

// ============================================================================
// Tool Definition
// ============================================================================

/// Calculate route tool - computes a route between two positions.
pub struct CalculateRouteTool {
    adapter: Arc<LocationAdapter>,
}

impl CalculateRouteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "calculate-route";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Calculate a route between two [longitude, latitude] \
        positions. Returns total distance and duration plus each leg with its steps.";

    pub fn definition(adapter: Arc<LocationAdapter>) -> ToolDefinition {
        ToolDefinition::new(Self::NAME, Self::DESCRIPTION, Arc::new(Self { adapter }))
            .param(ParamSpec::required(
                "departure",
                ParamType::NumberArray,
                "Start [longitude, latitude]",
            ))
            .param(ParamSpec::required(
                "destination",
                ParamType::NumberArray,
                "End [longitude, latitude]",
            ))
            .param(
                ParamSpec::optional("travel_mode", ParamType::String, "Travel mode (default Car)")
                    .one_of(TRAVEL_MODES),
            )
            .param(
                ParamSpec::optional(
                    "distance_unit",
                    ParamType::String,
                    "Unit of returned distances (default Kilometers)",
                )
                .one_of(DISTANCE_UNITS),
            )
            .output::<Route>()
    }
}

#[async_trait]
impl ToolHandler for CalculateRouteTool {
    async fn call(&self, args: Arguments) -> Result<serde_json::Value, ToolError> {
        let route = self
            .adapter
            .calculate_route(Directions {
                departure: args.list("departure")?,
                destination: args.list("destination")?,
                travel_mode: args.opt_str("travel_mode")?,
                distance_unit: args.opt_str("distance_unit")?,
            })
            .await?;
        info!(
            distance = route.distance,
            duration_seconds = route.duration_seconds,
            "Route calculated"
        );
        payload(&route)
    }
}
