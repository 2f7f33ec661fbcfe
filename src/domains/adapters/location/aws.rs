//! [`PlaceService`] on top of `aws-sdk-location`.

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_location::Client;
use aws_sdk_location::types::{
    CalculateRouteSummary, DistanceUnit, Leg, Place as SdkPlace, PlaceGeometry,
    SearchForTextResult, Step, TravelMode,
};

use super::{Place, PlaceQuery, PlaceService, Position, Route, RouteLeg, RouteQuery, RouteStep};
use crate::core::config::{AwsConfig, LocationConfig};
use crate::domains::adapters::aws::{classify_sdk_error, load_sdk_config, optional};
use crate::domains::adapters::failure::{BackendFailure, FailureClass};
use crate::domains::adapters::session::Connector;

/// Location Service error codes with a known meaning.
fn classify(code: &str, _message: &str) -> Option<FailureClass> {
    let class = match code {
        "ThrottlingException" => FailureClass::Throttled,
        "InternalServerException" => FailureClass::Unavailable,
        "ResourceNotFoundException" => FailureClass::NotFound,
        "AccessDeniedException" => FailureClass::AccessDenied,
        "ValidationException" => FailureClass::BadRequest,
        "ConflictException" => FailureClass::Conflict,
        _ => return None,
    };
    Some(class)
}

fn malformed(message: impl Into<String>) -> BackendFailure {
    BackendFailure::new(FailureClass::Other, "MalformedResponse", message)
}

/// First two coordinates of a point; a missing or short point is an error.
fn to_position(point: Option<&[f64]>, what: &str) -> Result<Position, BackendFailure> {
    match point {
        Some([lon, lat, ..]) => Ok([*lon, *lat]),
        _ => Err(malformed(format!("{what} has no position"))),
    }
}

fn from_sdk_place(place: &SdkPlace) -> Result<Place, BackendFailure> {
    let point: Option<&[f64]> = optional::<&PlaceGeometry>(place.geometry())
        .and_then(|geometry| optional::<&[f64]>(geometry.point()));
    Ok(Place {
        place_id: None,
        label: optional::<&str>(place.label()).map(str::to_string),
        position: to_position(point, "place")?,
        country: optional::<&str>(place.country()).map(str::to_string),
        region: optional::<&str>(place.region()).map(str::to_string),
        municipality: optional::<&str>(place.municipality()).map(str::to_string),
        relevance: None,
    })
}

fn from_search_result(result: &SearchForTextResult) -> Result<Place, BackendFailure> {
    let place = optional::<&SdkPlace>(result.place())
        .ok_or_else(|| malformed("search result has no place"))?;
    Ok(Place {
        place_id: optional::<&str>(result.place_id()).map(str::to_string),
        relevance: optional::<f64>(result.relevance()),
        ..from_sdk_place(place)?
    })
}

fn from_step(step: &Step) -> Result<RouteStep, BackendFailure> {
    Ok(RouteStep {
        start: to_position(optional::<&[f64]>(step.start_position()), "route step start")?,
        end: to_position(optional::<&[f64]>(step.end_position()), "route step end")?,
        distance: optional::<f64>(step.distance()).unwrap_or_default(),
        duration_seconds: optional::<f64>(step.duration_seconds()).unwrap_or_default(),
    })
}

fn from_leg(leg: &Leg) -> Result<RouteLeg, BackendFailure> {
    let steps: &[Step] = optional(leg.steps()).unwrap_or_default();
    Ok(RouteLeg {
        start: to_position(optional::<&[f64]>(leg.start_position()), "route leg start")?,
        end: to_position(optional::<&[f64]>(leg.end_position()), "route leg end")?,
        distance: optional::<f64>(leg.distance()).unwrap_or_default(),
        duration_seconds: optional::<f64>(leg.duration_seconds()).unwrap_or_default(),
        steps: steps.iter().map(from_step).collect::<Result<_, _>>()?,
    })
}

/// Location client bound to one place index and route calculator.
pub struct LocationService {
    client: Client,
    place_index: String,
    route_calculator: String,
}

impl LocationService {
    pub fn new(
        client: Client,
        place_index: impl Into<String>,
        route_calculator: impl Into<String>,
    ) -> Self {
        Self {
            client,
            place_index: place_index.into(),
            route_calculator: route_calculator.into(),
        }
    }
}

#[async_trait]
impl PlaceService for LocationService {
    async fn search_text(&self, query: PlaceQuery) -> Result<Vec<Place>, BackendFailure> {
        let output = self
            .client
            .search_place_index_for_text()
            .index_name(&self.place_index)
            .text(query.text)
            .max_results(query.max_results)
            .set_bias_position(query.bias_position.map(|position| position.to_vec()))
            .set_filter_countries((!query.countries.is_empty()).then_some(query.countries))
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        let results: &[SearchForTextResult] = optional(output.results()).unwrap_or_default();
        results.iter().map(from_search_result).collect()
    }

    async fn get_place(&self, place_id: &str) -> Result<Place, BackendFailure> {
        let output = self
            .client
            .get_place()
            .index_name(&self.place_index)
            .place_id(place_id)
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        let place: Option<&SdkPlace> = optional(output.place());
        let place = place.ok_or_else(|| {
            BackendFailure::not_found("ResourceNotFoundException", "GetPlace returned no place")
        })?;
        from_sdk_place(place)
    }

    async fn calculate_route(&self, query: RouteQuery) -> Result<Route, BackendFailure> {
        let output = self
            .client
            .calculate_route()
            .calculator_name(&self.route_calculator)
            .set_departure_position(Some(query.departure.to_vec()))
            .set_destination_position(Some(query.destination.to_vec()))
            .travel_mode(TravelMode::from(query.travel_mode.as_str()))
            .distance_unit(DistanceUnit::from(query.distance_unit.as_str()))
            .send()
            .await
            .map_err(|err| classify_sdk_error(err, classify))?;

        let legs: &[Leg] = optional(output.legs()).unwrap_or_default();
        let mut route = Route {
            distance_unit: query.distance_unit,
            legs: legs.iter().map(from_leg).collect::<Result<_, _>>()?,
            ..Route::default()
        };
        if let Some(summary) = optional::<&CalculateRouteSummary>(output.summary()) {
            route.distance = optional::<f64>(summary.distance()).unwrap_or_default();
            route.duration_seconds = optional::<f64>(summary.duration_seconds()).unwrap_or_default();
            if let Some(unit) = optional::<&DistanceUnit>(summary.distance_unit()) {
                route.distance_unit = unit.as_str().to_string();
            }
        }
        Ok(route)
    }
}

/// Builds [`LocationService`] clients from the process configuration.
pub struct LocationConnector {
    aws: AwsConfig,
    location: LocationConfig,
}

impl LocationConnector {
    pub fn new(aws: AwsConfig, location: LocationConfig) -> Self {
        Self { aws, location }
    }
}

#[async_trait]
impl Connector<dyn PlaceService> for LocationConnector {
    async fn connect(&self) -> Result<Arc<dyn PlaceService>, BackendFailure> {
        let (Some(place_index), Some(route_calculator)) =
            (&self.location.place_index, &self.location.route_calculator)
        else {
            return Err(BackendFailure::new(
                FailureClass::AccessDenied,
                "MissingConfiguration",
                "LOCATION_PLACE_INDEX and LOCATION_ROUTE_CALCULATOR must be set",
            ));
        };

        let sdk_config = load_sdk_config(&self.aws).await;
        Ok(Arc::new(LocationService::new(
            Client::new(&sdk_config),
            place_index.clone(),
            route_calculator.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(classify("ThrottlingException", ""), Some(FailureClass::Throttled));
        assert_eq!(classify("InternalServerException", ""), Some(FailureClass::Unavailable));
        assert_eq!(classify("ResourceNotFoundException", ""), Some(FailureClass::NotFound));
        assert_eq!(classify("ValidationException", ""), Some(FailureClass::BadRequest));
    }

    #[test]
    fn test_position_takes_first_two_coordinates() {
        assert_eq!(to_position(Some(&[1.0, 2.0][..]), "p").unwrap(), [1.0, 2.0]);
        assert_eq!(to_position(Some(&[1.0, 2.0, 30.0][..]), "p").unwrap(), [1.0, 2.0]);
        assert!(to_position(Some(&[1.0][..]), "p").is_err());
        assert!(to_position(None, "p").is_err());
    }

    #[test]
    fn test_place_without_geometry_is_malformed() {
        let place = SdkPlace::builder().label("Somewhere").build();
        let failure = from_sdk_place(&place).unwrap_err();
        assert_eq!(failure.code, "MalformedResponse");
        assert!(!failure.is_transient());

        let place = SdkPlace::builder()
            .label("Seattle")
            .geometry(PlaceGeometry::builder().point(-122.3).point(47.6).build())
            .build();
        assert_eq!(from_sdk_place(&place).unwrap().position, [-122.3, 47.6]);
    }
}
