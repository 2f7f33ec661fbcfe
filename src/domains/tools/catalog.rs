//! Tool catalog - which tools each service exposes.
//!
//! A server process serves exactly one service. [`build_registry`] binds that
//! service's tool definitions to its adapter and freezes them into a
//! [`ToolRegistry`].

use std::sync::Arc;

use super::definitions::{aurora, location, s3};
use super::registry::{RegistryError, ToolDefinition, ToolRegistry};
use crate::core::config::ServiceKind;
use crate::domains::adapters::{AuroraAdapter, LocationAdapter, S3Adapter};

/// The adapter a server process talks to.
#[derive(Clone)]
pub enum Backend {
    S3(Arc<S3Adapter>),
    Aurora(Arc<AuroraAdapter>),
    Location(Arc<LocationAdapter>),
}

impl Backend {
    pub fn service(&self) -> ServiceKind {
        match self {
            Self::S3(_) => ServiceKind::S3,
            Self::Aurora(_) => ServiceKind::Aurora,
            Self::Location(_) => ServiceKind::Location,
        }
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        match self {
            Self::S3(adapter) => s3::definitions(adapter.clone()),
            Self::Aurora(adapter) => aurora::definitions(adapter.clone()),
            Self::Location(adapter) => location::definitions(adapter.clone()),
        }
    }
}

/// Build the registry of every tool the backend's service exposes.
pub fn build_registry(backend: &Backend) -> Result<ToolRegistry, RegistryError> {
    let mut builder = ToolRegistry::builder();
    for definition in backend.definitions() {
        builder.register(definition)?;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::adapters::aurora::fake::FakeDataApi;
    use crate::domains::adapters::location::Place;
    use crate::domains::adapters::location::fake::FakePlaceService;
    use crate::domains::adapters::s3::fake::FakeObjectStore;
    use crate::domains::adapters::{
        AdapterSession, BackendFailure, DataApi, ObjectStore, PlaceService, RetryPolicy,
    };
    use crate::domains::tools::{Dispatcher, ErrorKind, ToolRequest, ToolResult};
    use serde_json::json;
    use std::time::Duration;

    fn s3_backend(store: Arc<FakeObjectStore>) -> Backend {
        Backend::S3(Arc::new(S3Adapter::new(
            AdapterSession::<dyn ObjectStore>::new(store),
            RetryPolicy::immediate(3),
        )))
    }

    fn aurora_backend(api: Arc<FakeDataApi>) -> Backend {
        Backend::Aurora(Arc::new(AuroraAdapter::new(
            AdapterSession::<dyn DataApi>::new(api),
            RetryPolicy::immediate(3),
            "postgres",
        )))
    }

    fn location_backend(service: Arc<FakePlaceService>) -> Backend {
        Backend::Location(Arc::new(LocationAdapter::new(
            AdapterSession::<dyn PlaceService>::new(service),
            RetryPolicy::immediate(3),
        )))
    }

    fn dispatcher(backend: &Backend) -> Dispatcher {
        Dispatcher::new(
            Arc::new(build_registry(backend).unwrap()),
            Duration::from_secs(5),
        )
    }

    async fn call(dispatcher: &Dispatcher, tool: &str, args: serde_json::Value) -> ToolResult {
        dispatcher
            .dispatch(ToolRequest::from_json(json!(1), tool, Some(args)))
            .await
    }

    fn error_kind(result: &ToolResult) -> ErrorKind {
        result.error().map(|e| e.kind).expect("expected an error")
    }

    #[test]
    fn test_each_service_exposes_its_tools() {
        let s3 = build_registry(&s3_backend(Arc::new(FakeObjectStore::default()))).unwrap();
        assert_eq!(
            s3.tool_names(),
            vec!["delete-object", "get-object", "list-buckets", "list-objects", "put-object"]
        );

        let aurora = build_registry(&aurora_backend(Arc::new(FakeDataApi::default()))).unwrap();
        assert_eq!(aurora.len(), 5);
        assert!(aurora.tool_names().contains(&"execute-statement-with-transaction"));

        let location =
            build_registry(&location_backend(Arc::new(FakePlaceService::default()))).unwrap();
        assert_eq!(
            location.tool_names(),
            vec!["calculate-route", "get-place", "search-places"]
        );
    }

    #[test]
    fn test_backend_service_kind() {
        let backend = aurora_backend(Arc::new(FakeDataApi::default()));
        assert_eq!(backend.service(), ServiceKind::Aurora);
    }

    #[test]
    fn test_every_tool_advertises_an_output_schema() {
        let registry = build_registry(&s3_backend(Arc::new(FakeObjectStore::default()))).unwrap();
        for tool in registry.to_tools() {
            assert!(tool.output_schema.is_some(), "{} has no output schema", tool.name);
        }
    }

    // ------------------------------------------------------------------------
    // S3
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_s3_list_and_read_objects() {
        let store = Arc::new(FakeObjectStore::with_bucket("docs"));
        store.insert("docs", "a.txt", b"hello");
        store.insert("docs", "b.txt", b"world");
        store.insert("docs", "c.txt", b"!");
        let dispatcher = dispatcher(&s3_backend(store));

        let buckets = call(&dispatcher, "list-buckets", json!({})).await;
        assert_eq!(buckets.payload().unwrap()["buckets"][0]["name"], "docs");

        let listing = call(&dispatcher, "list-objects", json!({"bucket": "docs", "max_keys": 2})).await;
        let listing = listing.payload().unwrap();
        assert_eq!(listing["objects"].as_array().unwrap().len(), 2);
        assert_eq!(listing["truncated"], true);

        let object = call(&dispatcher, "get-object", json!({"bucket": "docs", "key": "a.txt"})).await;
        let object = object.payload().unwrap();
        assert_eq!(object["content"], "hello");
        assert_eq!(object["encoding"], "utf-8");
    }

    #[tokio::test]
    async fn test_s3_missing_object_is_not_found() {
        let dispatcher = dispatcher(&s3_backend(Arc::new(FakeObjectStore::with_bucket("docs"))));

        let result = call(&dispatcher, "get-object", json!({"bucket": "docs", "key": "nope"})).await;
        let error = result.error().unwrap();
        assert_eq!(error.kind, ErrorKind::BackendError);
        assert_eq!(
            serde_json::to_value(error.classification).unwrap(),
            json!("not_found")
        );
        assert!(!error.retryable);
    }

    #[tokio::test]
    async fn test_s3_put_base64_then_delete() {
        let store = Arc::new(FakeObjectStore::with_bucket("docs"));
        let dispatcher = dispatcher(&s3_backend(store.clone()));

        let put = call(
            &dispatcher,
            "put-object",
            json!({"bucket": "docs", "key": "bin", "content": "/wD+", "encoding": "base64"}),
        )
        .await;
        assert!(put.is_success());

        let read = call(&dispatcher, "get-object", json!({"bucket": "docs", "key": "bin"})).await;
        assert_eq!(read.payload().unwrap()["encoding"], "base64");
        assert_eq!(read.payload().unwrap()["content"], "/wD+");

        let deleted = call(&dispatcher, "delete-object", json!({"bucket": "docs", "key": "bin"})).await;
        assert!(deleted.is_success());
    }

    #[tokio::test]
    async fn test_s3_unknown_encoding_never_reaches_backend() {
        let store = Arc::new(FakeObjectStore::with_bucket("docs"));
        let dispatcher = dispatcher(&s3_backend(store.clone()));

        let result = call(
            &dispatcher,
            "put-object",
            json!({"bucket": "docs", "key": "k", "content": "x", "encoding": "utf-16"}),
        )
        .await;
        assert_eq!(error_kind(&result), ErrorKind::ValidationError);
        assert_eq!(store.calls(), 0);
    }

    // ------------------------------------------------------------------------
    // Aurora
    // ------------------------------------------------------------------------

    #[tokio::test]
    async fn test_aurora_select_one() {
        let dispatcher = dispatcher(&aurora_backend(Arc::new(FakeDataApi::default())));

        let result = call(&dispatcher, "execute-statement", json!({"sql": "SELECT 1"})).await;
        let payload = result.payload().unwrap();
        assert_eq!(payload["columns"], json!(["?column?"]));
        assert_eq!(payload["rows"], json!([{"?column?": 1}]));
        assert_eq!(payload["rowCount"], 1);
    }

    #[tokio::test]
    async fn test_aurora_missing_sql_is_validation_error() {
        let api = Arc::new(FakeDataApi::default());
        let dispatcher = dispatcher(&aurora_backend(api.clone()));

        let result = call(&dispatcher, "execute-statement", json!({})).await;
        assert_eq!(error_kind(&result), ErrorKind::ValidationError);
        assert_eq!(result.error().unwrap().parameter.as_deref(), Some("sql"));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn test_aurora_transaction_through_tools() {
        let api = Arc::new(FakeDataApi::default());
        let dispatcher = dispatcher(&aurora_backend(api.clone()));

        let begun = call(&dispatcher, "begin-transaction", json!({})).await;
        let transaction_id = begun.payload().unwrap()["transactionId"]
            .as_str()
            .unwrap()
            .to_string();

        let insert = call(
            &dispatcher,
            "execute-statement-with-transaction",
            json!({
                "transaction_id": transaction_id,
                "sql": "INSERT INTO t VALUES (:v)",
                "parameters": {"v": 7}
            }),
        )
        .await;
        assert!(insert.is_success());

        let committed = call(
            &dispatcher,
            "commit-transaction",
            json!({"transaction_id": transaction_id}),
        )
        .await;
        assert_eq!(committed.payload().unwrap()["state"], "committed");

        let reused = call(
            &dispatcher,
            "execute-statement-with-transaction",
            json!({"transaction_id": transaction_id, "sql": "SELECT 1"}),
        )
        .await;
        assert_eq!(error_kind(&reused), ErrorKind::TransactionStateError);
    }

    #[tokio::test]
    async fn test_aurora_persistent_throttling() {
        let failures = (0..5).map(|_| BackendFailure::throttled("Too many connections"));
        let api = Arc::new(FakeDataApi::failing_with(failures));
        let dispatcher = dispatcher(&aurora_backend(api.clone()));

        let result = call(&dispatcher, "execute-statement", json!({"sql": "SELECT 1"})).await;
        assert_eq!(error_kind(&result), ErrorKind::Throttled);
        assert!(result.error().unwrap().retryable);
        assert_eq!(api.calls(), 3);
    }

    // ------------------------------------------------------------------------
    // Location
    // ------------------------------------------------------------------------

    fn space_needle() -> Place {
        Place {
            place_id: Some("p-1".to_string()),
            label: Some("Space Needle, Seattle".to_string()),
            position: [-122.349, 47.620],
            country: Some("USA".to_string()),
            ..Place::default()
        }
    }

    #[tokio::test]
    async fn test_location_search_and_get() {
        let service = Arc::new(FakePlaceService::with_places(vec![space_needle()]));
        let dispatcher = dispatcher(&location_backend(service));

        let found = call(&dispatcher, "search-places", json!({"text": "Space Needle"})).await;
        let places = &found.payload().unwrap()["places"];
        assert_eq!(places.as_array().unwrap().len(), 1);
        assert_eq!(places[0]["placeId"], "p-1");

        let place = call(&dispatcher, "get-place", json!({"place_id": "p-1"})).await;
        assert_eq!(place.payload().unwrap()["position"], json!([-122.349, 47.620]));

        let missing = call(&dispatcher, "get-place", json!({"place_id": "p-404"})).await;
        assert_eq!(error_kind(&missing), ErrorKind::BackendError);
    }

    #[tokio::test]
    async fn test_location_route_defaults_and_modes() {
        let service = Arc::new(FakePlaceService::default());
        let dispatcher = dispatcher(&location_backend(service.clone()));

        let route = call(
            &dispatcher,
            "calculate-route",
            json!({"departure": [-122.3, 47.6], "destination": [-122.2, 47.7]}),
        )
        .await;
        let route = route.payload().unwrap();
        assert_eq!(route["distanceUnit"], "Kilometers");
        assert_eq!(route["legs"].as_array().unwrap().len(), 1);

        let bad_mode = call(
            &dispatcher,
            "calculate-route",
            json!({
                "departure": [-122.3, 47.6],
                "destination": [-122.2, 47.7],
                "travel_mode": "Teleport"
            }),
        )
        .await;
        assert_eq!(error_kind(&bad_mode), ErrorKind::ValidationError);
        assert_eq!(service.calls(), 1);
    }
}
