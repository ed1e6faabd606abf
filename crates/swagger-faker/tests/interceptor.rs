//! Integration tests for the interceptor.
//!
//! Tests drive `FakerService` in-process with `tower::ServiceExt::oneshot()`,
//! in front of a stub application that answers every request with
//! `200 real`.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use swagger_faker::{FakerConfig, FakerLayer, Interceptor, RouteLookup, RouteTable};
use swagger_faker_generator::{
    Constraints, GenerateError, MockRequest, ResponseGenerator, SchemaGenerator,
};
use swagger_faker_router::Router;
use swagger_faker_spec::parse_document;
use swagger_faker_telemetry::{prometheus::render_metrics, MetricsRegistry};
use tower::{Layer, ServiceExt};

// ---------------------------------------------------------------------------
// Test harness
// ---------------------------------------------------------------------------

/// Owned copy of the arguments of one generator call.
#[derive(Debug, Clone, PartialEq)]
struct Call {
    schema: String,
    path: String,
    operation: String,
    status: u16,
    constraints: Constraints,
    seed: i64,
}

/// Generator that records its calls and returns a fixed body.
#[derive(Default)]
struct RecordingGenerator {
    calls: Mutex<Vec<Call>>,
}

impl RecordingGenerator {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl ResponseGenerator for RecordingGenerator {
    fn generate(&self, request: &MockRequest<'_>) -> Result<Value, GenerateError> {
        self.calls.lock().unwrap().push(Call {
            schema: request.schema.to_string(),
            path: request.path.to_string(),
            operation: request.operation.to_string(),
            status: request.status,
            constraints: request.constraints.clone(),
            seed: request.seed,
        });
        Ok(json!({"fake": true}))
    }
}

fn enabled_config() -> FakerConfig {
    FakerConfig {
        enabled: true,
        ..FakerConfig::new("petstore.yaml")
    }
}

/// Host route table: only `GET /pets` exists.
fn routes() -> Router<()> {
    let mut routes = Router::new();
    routes.insert("/pets", "GET", ());
    routes
}

/// Route table that counts lookups and finds every route.
#[derive(Default)]
struct CountingRoutes {
    lookups: AtomicUsize,
}

impl CountingRoutes {
    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl RouteTable for CountingRoutes {
    fn match_route(&self, _path: &str, _method: &Method) -> RouteLookup {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        RouteLookup::Found
    }
}

struct Harness {
    config: FakerConfig,
    routes: Arc<dyn RouteTable>,
    generator: Arc<dyn ResponseGenerator>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Harness {
    fn new(config: FakerConfig, generator: Arc<dyn ResponseGenerator>) -> Self {
        Self {
            config,
            routes: Arc::new(routes()),
            generator,
            metrics: None,
        }
    }

    fn with_routes(mut self, routes: Arc<dyn RouteTable>) -> Self {
        self.routes = routes;
        self
    }

    fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Send one request through the interceptor and collect the response.
    async fn send(&self, req: Request<Body>) -> Sent {
        let mut interceptor = Interceptor::new(
            Arc::new(self.config.clone()),
            Arc::clone(&self.routes),
            Arc::clone(&self.generator),
        );
        if let Some(metrics) = &self.metrics {
            interceptor = interceptor.with_metrics(Arc::clone(metrics));
        }

        let app = tower::service_fn(|_req: Request<Body>| async {
            Ok::<_, Infallible>(Response::new(Body::from("real")))
        });
        let service = FakerLayer::new(interceptor).layer(app);

        let resp: Response = service.oneshot(req).await.expect("service returned error");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .into_body()
            .collect()
            .await
            .expect("body collect failed")
            .to_bytes()
            .to_vec();
        Sent {
            status,
            headers,
            body,
        }
    }
}

struct Sent {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Sent {
    fn is_real(&self) -> bool {
        self.status == StatusCode::OK && self.body == b"real"
    }

    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response is not valid JSON")
    }
}

fn request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn request_with(method: Method, path: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn routed_request_passes_through() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator.clone());

    let resp = harness.send(request(Method::GET, "/pets")).await;
    assert!(resp.is_real());
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn unrouted_request_is_mocked_with_method_default() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator.clone());

    let resp = harness.send(request(Method::POST, "/pets")).await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.headers["content-type"], "application/json");
    assert_eq!(resp.json(), json!({"fake": true}));

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].operation, "post");
    assert_eq!(calls[0].status, 201);
}

#[tokio::test]
async fn get_without_route_calls_generator_with_defaults() {
    let generator = Arc::new(RecordingGenerator::default());
    let config = FakerConfig {
        max_items: 10,
        ..enabled_config()
    };
    let harness = Harness::new(config, generator.clone());

    let resp = harness.send(request(Method::GET, "/owners")).await;
    assert_eq!(resp.status, StatusCode::OK);

    assert_eq!(
        generator.calls(),
        vec![Call {
            schema: "petstore.yaml".to_string(),
            path: "/owners".to_string(),
            operation: "get".to_string(),
            status: 200,
            constraints: Constraints::default(),
            seed: 0,
        }]
    );
}

#[tokio::test]
async fn header_disable_always_passes_through() {
    let generator = Arc::new(RecordingGenerator::default());
    let config = FakerConfig {
        hijack: true,
        ..enabled_config()
    };
    let harness = Harness::new(config, generator.clone());

    for path in ["/pets", "/owners"] {
        let resp = harness
            .send(request_with(
                Method::GET,
                path,
                &[("x-swagger-faker-enabled", "false")],
            ))
            .await;
        assert!(resp.is_real(), "{path}");
    }

    let resp = harness
        .send(request_with(
            Method::GET,
            "/owners",
            &[
                ("x-swagger-faker-enabled", "false"),
                ("x-swagger-faker-hijack", "true"),
            ],
        ))
        .await;
    assert!(resp.is_real());
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn static_disable_makes_interceptor_inert() {
    let generator = Arc::new(RecordingGenerator::default());
    let config = FakerConfig {
        enabled: false,
        hijack: true,
        ..FakerConfig::new("petstore.yaml")
    };
    let harness = Harness::new(config, generator.clone());

    let resp = harness
        .send(request_with(
            Method::GET,
            "/owners",
            &[
                ("x-swagger-faker-enabled", "true"),
                ("x-swagger-faker-hijack", "true"),
            ],
        ))
        .await;
    assert!(resp.is_real());
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn hijack_mocks_routed_request() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator.clone());

    let resp = harness
        .send(request_with(
            Method::GET,
            "/pets",
            &[("x-swagger-faker-hijack", "true")],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), json!({"fake": true}));
    assert_eq!(generator.calls().len(), 1);
}

#[tokio::test]
async fn static_hijack_can_be_turned_off_per_request() {
    let generator = Arc::new(RecordingGenerator::default());
    let config = FakerConfig {
        hijack: true,
        ..enabled_config()
    };
    let harness = Harness::new(config, generator.clone());

    let resp = harness.send(request(Method::GET, "/pets")).await;
    assert_eq!(resp.json(), json!({"fake": true}));

    let resp = harness
        .send(request_with(
            Method::GET,
            "/pets",
            &[("x-swagger-faker-hijack", "no")],
        ))
        .await;
    assert!(resp.is_real());
}

#[tokio::test]
async fn hijack_skips_route_table() {
    let generator = Arc::new(RecordingGenerator::default());
    let routes = Arc::new(CountingRoutes::default());
    let harness =
        Harness::new(enabled_config(), generator.clone()).with_routes(routes.clone());

    let resp = harness
        .send(request_with(
            Method::GET,
            "/pets",
            &[("x-swagger-faker-hijack", "true")],
        ))
        .await;
    assert_eq!(resp.json(), json!({"fake": true}));
    assert_eq!(routes.lookups(), 0);

    let resp = harness.send(request(Method::GET, "/pets")).await;
    assert!(resp.is_real());
    assert_eq!(routes.lookups(), 1);
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_code_header_overrides_default() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator.clone());

    let resp = harness
        .send(request_with(
            Method::GET,
            "/owners",
            &[("x-swagger-faker-response-code", "404")],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(generator.calls()[0].status, 404);
}

#[tokio::test]
async fn constraint_headers_reach_generator() {
    let generator = Arc::new(RecordingGenerator::default());
    let config = FakerConfig {
        seed: Some(9),
        ..enabled_config()
    };
    let harness = Harness::new(config, generator.clone());

    harness
        .send(request_with(
            Method::GET,
            "/owners",
            &[
                ("x-swagger-faker-max-items", "3"),
                ("x-swagger-faker-unique-items", "true"),
                ("x-swagger-faker-seed", "77"),
            ],
        ))
        .await;
    harness
        .send(request_with(
            Method::GET,
            "/owners",
            &[("x-swagger-faker-unique-items", "1")],
        ))
        .await;

    let calls = generator.calls();
    assert_eq!(calls[0].constraints.max_items, 3);
    assert!(calls[0].constraints.unique_items);
    assert_eq!(calls[0].seed, 77);

    assert_eq!(calls[1].constraints.max_items, 10);
    assert!(!calls[1].constraints.unique_items);
    assert_eq!(calls[1].seed, 9);
}

// ---------------------------------------------------------------------------
// Response shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mocked_response_carries_cors_headers() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator);

    let resp = harness
        .send(request_with(
            Method::GET,
            "/owners",
            &[("origin", "https://app.example.com")],
        ))
        .await;
    let headers = &resp.headers;
    assert_eq!(headers["access-control-allow-origin"], "https://app.example.com");
    assert_eq!(headers["access-control-allow-headers"], "Authorization, Content-Type");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, PATCH, PUT, DELETE");
    assert_eq!(headers["access-control-max-age"], "86400");
    assert_eq!(headers["allow"], "GET, POST, PATCH, PUT, DELETE");
    assert_eq!(headers["x-status-code"], "200");
}

#[tokio::test]
async fn options_returns_headers_only() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator.clone());

    let resp = harness
        .send(request_with(
            Method::OPTIONS,
            "/pets",
            &[("origin", "https://app.example.com")],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.is_empty());
    assert!(!resp.headers.contains_key("content-type"));
    assert_eq!(resp.headers["access-control-allow-origin"], "https://app.example.com");
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn no_content_status_has_empty_body() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator.clone());

    let resp = harness.send(request(Method::DELETE, "/pets/1")).await;
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert!(resp.body.is_empty());
    assert_eq!(resp.headers["x-status-code"], "200");
    assert_eq!(generator.calls()[0].operation, "delete");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn head_without_status_is_problem_response() {
    let generator = Arc::new(RecordingGenerator::default());
    let metrics = Arc::new(MetricsRegistry::new());
    let harness =
        Harness::new(enabled_config(), generator.clone()).with_metrics(Arc::clone(&metrics));

    let resp = harness.send(request(Method::HEAD, "/owners")).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers["content-type"], "application/problem+json");
    let problem = resp.json();
    assert_eq!(problem["status"], 500);
    assert!(problem["detail"].as_str().unwrap().contains("HEAD"));
    assert!(generator.calls().is_empty());

    let output = render_metrics(&metrics);
    assert!(output.contains("swagger_faker_mock_errors_total{reason=\"unsupported_method\"} 1"));
}

#[tokio::test]
async fn head_with_status_header_is_mocked() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator.clone());

    let resp = harness
        .send(request_with(
            Method::HEAD,
            "/owners",
            &[("x-swagger-faker-response-code", "200")],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(generator.calls()[0].operation, "head");
}

#[tokio::test]
async fn malformed_status_header_is_problem_response() {
    let generator = Arc::new(RecordingGenerator::default());
    let harness = Harness::new(enabled_config(), generator);

    let resp = harness
        .send(request_with(
            Method::GET,
            "/owners",
            &[("x-swagger-faker-response-code", "abc")],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers["content-type"], "application/problem+json");
}

// ---------------------------------------------------------------------------
// With the schema generator
// ---------------------------------------------------------------------------

const PETSTORE: &str = r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      responses:
        "200":
          description: pets
          schema:
            type: array
            items:
              $ref: "#/definitions/Pet"
definitions:
  Pet:
    type: object
    required: [id, name]
    properties:
      id:
        type: integer
      name:
        type: string
"##;

fn schema_generator() -> Arc<dyn ResponseGenerator> {
    Arc::new(
        SchemaGenerator::new()
            .with_document("petstore.yaml", parse_document(PETSTORE).unwrap()),
    )
}

#[tokio::test]
async fn generates_body_from_document() {
    let harness = Harness::new(
        FakerConfig {
            hijack: true,
            ..enabled_config()
        },
        schema_generator(),
    );

    let resp = harness
        .send(request_with(
            Method::GET,
            "/pets",
            &[
                ("x-swagger-faker-max-items", "2"),
                ("x-swagger-faker-min-items", "1"),
                ("x-swagger-faker-seed", "5"),
            ],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let pets = resp.json();
    let pets = pets.as_array().unwrap();
    assert!((1..=2).contains(&pets.len()));
    for pet in pets {
        assert!(pet["id"].is_i64());
        assert!(pet["name"].is_string());
    }
}

#[tokio::test]
async fn same_seed_same_body() {
    let harness = Harness::new(
        FakerConfig {
            hijack: true,
            seed: Some(123),
            ..enabled_config()
        },
        schema_generator(),
    );

    let first = harness.send(request(Method::GET, "/pets")).await;
    let second = harness.send(request(Method::GET, "/pets")).await;
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn unseeded_requests_are_reproducible() {
    let harness = Harness::new(
        FakerConfig {
            hijack: true,
            ..enabled_config()
        },
        schema_generator(),
    );

    let first = harness.send(request(Method::GET, "/pets")).await;
    let second = harness.send(request(Method::GET, "/pets")).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn huge_item_headers_are_capped() {
    let harness = Harness::new(
        FakerConfig {
            hijack: true,
            ..enabled_config()
        },
        schema_generator(),
    );

    let resp = harness
        .send(request_with(
            Method::GET,
            "/pets",
            &[
                ("x-swagger-faker-min-items", "9000000000000000000"),
                ("x-swagger-faker-max-items", "9000000000000000000"),
            ],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let pets = resp.json();
    let pets = pets.as_array().unwrap();
    assert!(!pets.is_empty());
    assert!(pets.len() <= swagger_faker_generator::faker::MAX_ARRAY_ITEMS as usize);
}

const SHARED_RESPONSES: &str = r##"
openapi: "3.0.3"
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      responses:
        "200":
          $ref: "#/components/responses/PetList"
components:
  responses:
    PetList:
      description: pets
      content:
        application/json:
          schema:
            type: array
            items:
              $ref: "#/components/schemas/Pet"
  schemas:
    Pet:
      type: object
      required: [id, name]
      properties:
        id:
          type: integer
        name:
          type: string
"##;

#[tokio::test]
async fn shared_response_is_generated() {
    let generator = SchemaGenerator::new()
        .with_document("petstore.yaml", parse_document(SHARED_RESPONSES).unwrap());
    let harness = Harness::new(enabled_config(), Arc::new(generator));

    let resp = harness
        .send(request_with(
            Method::GET,
            "/pets",
            &[
                ("x-swagger-faker-hijack", "true"),
                ("x-swagger-faker-min-items", "1"),
            ],
        ))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let pets = resp.json();
    let pets = pets.as_array().unwrap();
    assert!(!pets.is_empty());
    for pet in pets {
        assert!(pet["id"].is_i64());
        assert!(pet["name"].is_string());
    }
}

#[tokio::test]
async fn undocumented_operation_is_problem_response() {
    let metrics = Arc::new(MetricsRegistry::new());
    let harness = Harness::new(enabled_config(), schema_generator())
        .with_metrics(Arc::clone(&metrics));

    let resp = harness.send(request(Method::GET, "/owners")).await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);

    let output = render_metrics(&metrics);
    assert!(output.contains("swagger_faker_requests_total{decision=\"Mocked\",method=\"GET\"} 1"));
    assert!(output.contains("swagger_faker_mock_errors_total{reason=\"unknown_operation\"} 1"));
}
