//! Amazon Location Service: place search and routing.

mod aws;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use tracing::instrument;

use super::failure::BackendFailure;
use super::retry::RetryPolicy;
use super::session::AdapterSession;
use crate::domains::tools::{ToolError, Value};

pub use aws::{LocationConnector, LocationService};

/// `[longitude, latitude]` in WGS 84.
pub type Position = [f64; 2];

pub const DEFAULT_MAX_RESULTS: i64 = 10;
pub const MAX_RESULTS_LIMIT: i64 = 50;

pub const TRAVEL_MODES: &[&str] = &["Car", "Truck", "Walking", "Bicycle", "Motorcycle"];
pub const DISTANCE_UNITS: &[&str] = &["Kilometers", "Miles"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub municipality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceQuery {
    pub text: String,
    pub max_results: i32,
    pub bias_position: Option<Position>,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub departure: Position,
    pub destination: Position,
    pub travel_mode: String,
    pub distance_unit: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub start: Position,
    pub end: Position,
    pub distance: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub start: Position,
    pub end: Position,
    pub distance: f64,
    pub duration_seconds: f64,
    pub steps: Vec<RouteStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub distance: f64,
    pub duration_seconds: f64,
    pub distance_unit: String,
    pub legs: Vec<RouteLeg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct PlaceList {
    pub places: Vec<Place>,
}

/// The Location Service operations used by the Location server.
#[async_trait]
pub trait PlaceService: Send + Sync {
    async fn search_text(&self, query: PlaceQuery) -> Result<Vec<Place>, BackendFailure>;

    async fn get_place(&self, place_id: &str) -> Result<Place, BackendFailure>;

    async fn calculate_route(&self, query: RouteQuery) -> Result<Route, BackendFailure>;
}

/// Search arguments as given by a tool call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Search<'a> {
    pub text: &'a str,
    pub max_results: Option<i64>,
    pub bias_position: Option<&'a [Value]>,
    pub countries: Option<&'a [Value]>,
}

/// Routing arguments as given by a tool call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Directions<'a> {
    pub departure: &'a [Value],
    pub destination: &'a [Value],
    pub travel_mode: Option<&'a str>,
    pub distance_unit: Option<&'a str>,
}

pub struct LocationAdapter {
    session: AdapterSession<dyn PlaceService>,
    policy: RetryPolicy,
}

impl LocationAdapter {
    pub fn new(session: AdapterSession<dyn PlaceService>, policy: RetryPolicy) -> Self {
        Self { session, policy }
    }

    #[instrument(skip_all)]
    pub async fn search_places(&self, search: Search<'_>) -> Result<PlaceList, ToolError> {
        if search.text.trim().is_empty() {
            return Err(ToolError::parameter_type("text", "search text must not be empty"));
        }
        let query = PlaceQuery {
            text: search.text.to_string(),
            max_results: search
                .max_results
                .unwrap_or(DEFAULT_MAX_RESULTS)
                .clamp(1, MAX_RESULTS_LIMIT) as i32,
            bias_position: search
                .bias_position
                .map(|values| position("bias_position", values))
                .transpose()?,
            countries: countries(search.countries)?,
        };

        let places = self
            .session
            .call(&self.policy, "search_place_index_for_text", |service| {
                let query = query.clone();
                async move { service.search_text(query).await }
            })
            .await?;
        Ok(PlaceList { places })
    }

    #[instrument(skip_all)]
    pub async fn get_place(&self, place_id: &str) -> Result<Place, ToolError> {
        if place_id.trim().is_empty() {
            return Err(ToolError::parameter_type("place_id", "place id must not be empty"));
        }
        let mut place = self
            .session
            .call(&self.policy, "get_place", |service| async move {
                service.get_place(place_id).await
            })
            .await?;
        place.place_id.get_or_insert_with(|| place_id.to_string());
        Ok(place)
    }

    #[instrument(skip_all, fields(travel_mode = directions.travel_mode.unwrap_or("Car")))]
    pub async fn calculate_route(&self, directions: Directions<'_>) -> Result<Route, ToolError> {
        let query = RouteQuery {
            departure: position("departure", directions.departure)?,
            destination: position("destination", directions.destination)?,
            travel_mode: directions.travel_mode.unwrap_or("Car").to_string(),
            distance_unit: directions.distance_unit.unwrap_or("Kilometers").to_string(),
        };

        self.session
            .call(&self.policy, "calculate_route", |service| {
                let query = query.clone();
                async move { service.calculate_route(query).await }
            })
            .await
    }
}

/// Parse `[longitude, latitude]`.
pub fn position(parameter: &str, values: &[Value]) -> Result<Position, ToolError> {
    let [lon, lat] = values else {
        return Err(ToolError::parameter_type(
            parameter,
            format!("expected [longitude, latitude], got {} values", values.len()),
        ));
    };
    let (Some(lon), Some(lat)) = (lon.as_f64(), lat.as_f64()) else {
        return Err(ToolError::parameter_type(parameter, "coordinates must be numbers"));
    };
    if !lon.is_finite() || !lat.is_finite() {
        return Err(ToolError::parameter_type(parameter, "coordinates must be finite"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ToolError::parameter_type(
            parameter,
            format!("longitude {lon} is outside [-180, 180]"),
        ));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ToolError::parameter_type(
            parameter,
            format!("latitude {lat} is outside [-90, 90]"),
        ));
    }
    Ok([lon, lat])
}

/// ISO 3166 alpha-3 country filter, upper-cased.
fn countries(values: Option<&[Value]>) -> Result<Vec<String>, ToolError> {
    values
        .unwrap_or_default()
        .iter()
        .map(|value| {
            let code = value.as_str().unwrap_or_default();
            if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
                Ok(code.to_ascii_uppercase())
            } else {
                Err(ToolError::parameter_type(
                    "countries",
                    format!("'{code}' is not an ISO 3166 alpha-3 country code"),
                ))
            }
        })
        .collect()
}
