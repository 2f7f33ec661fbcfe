//! Amazon Location Service tools.

pub mod calculate_route;
pub mod get_place;
pub mod search_places;

pub use calculate_route::CalculateRouteTool;
pub use get_place::GetPlaceTool;
pub use search_places::SearchPlacesTool;

use std::sync::Arc;

use crate::domains::adapters::LocationAdapter;
use crate::domains::tools::ToolDefinition;

/// Every Location tool, bound to one adapter.
pub fn definitions(adapter: Arc<LocationAdapter>) -> Vec<ToolDefinition> {
    vec![
        SearchPlacesTool::definition(adapter.clone()),
        GetPlaceTool::definition(adapter.clone()),
        CalculateRouteTool::definition(adapter),
    ]
}
