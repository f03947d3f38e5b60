//! End-to-end pipeline tests against a mock service backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use sky_executor::Executor;
use sky_primitives::{
    Argument, ArgumentMap, Cell, ColumnSpec, FailureCode, ModuleDescriptor, ServiceValue,
    TableValue,
};
use sky_registry::{CredentialProvider, OperationRegistry};
use sky_services::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};

struct MockTarget;

#[async_trait]
impl ServiceTarget for MockTarget {
    fn service_name(&self) -> &str {
        "mock"
    }

    fn members(&self) -> Vec<MemberSpec> {
        vec![
            MemberSpec::new(
                "query_object",
                "Query one object.\n\nParameters\n----------\nobject_name : object identifier\n",
            )
            .param(ParamSpec::required("object_name", "str"))
            .param(ParamSpec::optional("verbose", "bool", json!(false))),
            MemberSpec::new(
                "query_region",
                "Cone search.\n\nParameters\n----------\ncoordinates : search center\ncatalog : table to search\n",
            )
            .param(ParamSpec::required("coordinates", "coordinates"))
            .param(ParamSpec::required("catalog", "str"))
            .param(ParamSpec::optional("radius", "angle", json!("2 arcmin"))),
            MemberSpec::new("get_fail", "Always fails.\n"),
            MemberSpec::new("_reset", "Internal.\n"),
            MemberSpec::new("ping", "Not dispatchable.\n"),
        ]
    }

    async fn invoke(&self, operation: &str, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        match operation {
            "query_object" => {
                let mut table = TableValue::new(vec![
                    ColumnSpec::new("main_id"),
                    ColumnSpec::new("ra").with_unit("deg"),
                    ColumnSpec::new("dec").with_unit("deg"),
                ]);
                table.push_row(vec![
                    Cell::Text("M  31".into()),
                    Cell::Float(10.684_708),
                    Cell::Float(41.268_75),
                ]);
                table.push_row(vec![Cell::Text("M  32".into()), Cell::Null, Cell::Null]);
                Ok(table.into())
            }
            "query_region" => {
                let position = args
                    .get("coordinates")
                    .and_then(Argument::position)
                    .ok_or_else(|| {
                        ServiceError::invalid_parameter("coordinates", "expected a position")
                    })?;
                Ok(ServiceValue::Position(position.clone()))
            }
            "get_fail" => Err(ServiceError::transport("mock", "connection reset")),
            other => Err(ServiceError::unknown_operation(other)),
        }
    }
}

struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn credential(&self, _key: &str) -> Option<String> {
        None
    }
}

fn mock_executor() -> Executor {
    Executor::new(Arc::new(mock_registry(None)))
}

fn mock_registry(counter: Option<Arc<AtomicUsize>>) -> OperationRegistry {
    let mut registry = OperationRegistry::new(Arc::new(NoCredentials));
    registry
        .register(
            ModuleDescriptor::new("mock", "tests::MockTarget").unwrap(),
            Box::new(move |_| {
                if let Some(counter) = &counter {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                let target: Arc<dyn ServiceTarget> = Arc::new(MockTarget);
                Ok(target)
            }),
        )
        .unwrap();
    registry
}

fn args(entries: &[(&str, Value)]) -> Map<String, Value> {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_owned(), value.clone()))
        .collect()
}

#[tokio::test]
async fn tabular_success_has_columns_data_and_row_count() {
    let executor = mock_executor();
    let result = executor
        .execute("mock", "query_object", &args(&[("object_name", json!("M 31"))]))
        .await;

    let payload = result.payload().expect("success");
    assert_eq!(payload["columns"], json!(["main_id", "ra", "dec"]));
    assert_eq!(payload["row_count"], json!(2));

    let data = payload["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    for record in data {
        let keys: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["main_id", "ra", "dec"]);
    }
    // Masked cells surface as explicit nulls.
    assert_eq!(data[1]["ra"], Value::Null);
}

#[tokio::test]
async fn coordinate_pair_string_reaches_backend_as_position() {
    let executor = mock_executor();
    let result = executor
        .execute(
            "mock",
            "query_region",
            &args(&[
                ("coordinates", json!("10.684708 41.26875")),
                ("catalog", json!("pointless")),
            ]),
        )
        .await;

    let payload = result.payload().expect("success");
    assert_eq!(payload["frame"], json!("icrs"));
    assert!((payload["ra_deg"].as_f64().unwrap() - 10.684_708).abs() < 1e-9);
    assert!((payload["dec_deg"].as_f64().unwrap() - 41.268_75).abs() < 1e-9);
}

#[tokio::test]
async fn validation_failure_names_every_missing_parameter() {
    let executor = mock_executor();
    let result = executor.execute("mock", "query_region", &Map::new()).await;

    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.code(), FailureCode::ValidationError);
    assert!(failure.message().contains("coordinates"));
    assert!(failure.message().contains("catalog"));
    assert_eq!(failure.details()["missing"], json!(["coordinates", "catalog"]));
}

#[tokio::test]
async fn unknown_module_fails_with_suggestion() {
    let executor = mock_executor();
    let result = executor.execute("mok", "query_object", &Map::new()).await;

    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.code(), FailureCode::ModuleNotFound);
    assert!(!failure.suggestion().is_empty());
    assert!(failure.suggestion().contains("mock"));
}

#[tokio::test]
async fn far_off_module_id_lists_available_modules() {
    let executor = mock_executor();
    let result = executor
        .execute("nonexistent", "query_object", &Map::new())
        .await;

    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.code(), FailureCode::ModuleNotFound);
    assert!(!failure.suggestion().is_empty());
    assert!(failure.suggestion().contains("mock"));
}

#[tokio::test]
async fn far_off_operation_name_lists_available_operations() {
    let executor = mock_executor();
    let result = executor
        .execute("mock", "zzzzzz", &Map::new())
        .await;

    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.code(), FailureCode::OperationNotFound);
    assert!(!failure.suggestion().is_empty());
    assert!(failure.suggestion().contains("query_object"));
}

#[tokio::test]
async fn unknown_operation_fails_with_suggestion() {
    let executor = mock_executor();
    let result = executor
        .execute("mock", "query_objcet", &args(&[("object_name", json!("x"))]))
        .await;

    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.code(), FailureCode::OperationNotFound);
    assert!(failure.suggestion().contains("query_object"));
}

#[tokio::test]
async fn private_and_unverbed_members_are_not_callable() {
    let executor = mock_executor();
    for operation in ["_reset", "ping"] {
        let result = executor.execute("mock", operation, &Map::new()).await;
        let failure = result.as_failure().expect("failure");
        assert_eq!(failure.code(), FailureCode::OperationNotFound);
    }
}

#[tokio::test]
async fn bad_radius_value_is_an_invalid_argument() {
    let executor = mock_executor();
    let result = executor
        .execute(
            "mock",
            "query_region",
            &args(&[
                ("coordinates", json!("10.0 20.0")),
                ("catalog", json!("pointless")),
                ("radius", json!("5 parsec")),
            ]),
        )
        .await;

    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.code(), FailureCode::InvalidArgument);
    assert_eq!(failure.details()["parameter"], json!("radius"));
}

#[tokio::test]
async fn transport_failure_is_recoverable_upstream() {
    let executor = mock_executor();
    let result = executor.execute("mock", "get_fail", &Map::new()).await;

    let failure = result.as_failure().expect("failure");
    assert_eq!(failure.code(), FailureCode::UpstreamError);
    assert!(failure.recoverable());
}

#[tokio::test]
async fn concurrent_first_access_constructs_the_backend_once() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(mock_registry(Some(Arc::clone(&constructions))));

    let resolves = (0..16).map(|_| {
        let registry = Arc::clone(&registry);
        async move { registry.resolve("mock").await }
    });
    let resolved = futures::future::join_all(resolves).await;

    assert!(resolved.iter().all(Result::is_ok));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn case_insensitive_lookup_shares_the_instance() {
    let registry = Arc::new(mock_registry(None));
    let lower = registry.resolve("mock").await.unwrap();
    let upper = registry.resolve("Mock").await.unwrap();
    assert!(Arc::ptr_eq(&lower, &upper));

    let executor = Executor::new(registry);
    let result = executor
        .execute("MOCK", "query_object", &args(&[("object_name", json!("M 31"))]))
        .await;
    assert!(result.is_success());
}
