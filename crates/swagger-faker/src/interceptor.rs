//! The request interceptor.
//!
//! Runs before route dispatch. Each request is either handed to the inner
//! service untouched ([`Decision::Passthrough`]) or answered with a response
//! generated from the API document ([`Decision::Mocked`]).

use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, ORIGIN},
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    response::{IntoResponse, Response},
};
use futures_util::future::{self, Either, Ready};
use swagger_faker_generator::{MockRequest, ResponseGenerator};
use swagger_faker_router::{RouteMatch, Router};
use swagger_faker_telemetry::{
    log_mock_error, log_request_intercepted, DecisionLabel, MetricsRegistry,
};
use tower::{Layer, Service};

use crate::config::FakerConfig;
use crate::error::{FakerError, ProblemDetails, ResolveError};
use crate::headers::cors_headers;
use crate::resolve::{resolve, resolve_mode, Mode, ResolvedSettings};

/// Outcome of asking the host's route table about a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteLookup {
    Found,
    MethodNotAllowed,
    NotFound,
}

/// The host application's route table.
pub trait RouteTable: Send + Sync {
    fn match_route(&self, path: &str, method: &Method) -> RouteLookup;
}

impl<T: Send + Sync> RouteTable for Router<T> {
    fn match_route(&self, path: &str, method: &Method) -> RouteLookup {
        match self.lookup(path, method.as_str()) {
            RouteMatch::Found { .. } => RouteLookup::Found,
            RouteMatch::MethodNotAllowed { .. } => RouteLookup::MethodNotAllowed,
            RouteMatch::NotFound => RouteLookup::NotFound,
        }
    }
}

/// What the interceptor does with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Passthrough,
    Mocked,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Passthrough => "passthrough",
            Decision::Mocked => "mocked",
        }
    }
}

impl From<Decision> for DecisionLabel {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Passthrough => DecisionLabel::Passthrough,
            Decision::Mocked => DecisionLabel::Mocked,
        }
    }
}

/// Decide how to handle a request given its mode.
///
/// The route table is only consulted when hijack mode is off. Both
/// `NotFound` and `MethodNotAllowed` mean no real handler exists.
pub fn decide(mode: Mode, routes: &dyn RouteTable, path: &str, method: &Method) -> Decision {
    if !mode.enabled {
        return Decision::Passthrough;
    }
    if mode.hijack {
        return Decision::Mocked;
    }
    match routes.match_route(path, method) {
        RouteLookup::Found => Decision::Passthrough,
        RouteLookup::MethodNotAllowed | RouteLookup::NotFound => Decision::Mocked,
    }
}

/// Shared interceptor state: configuration, route table, generator.
pub struct Interceptor {
    config: Arc<FakerConfig>,
    routes: Arc<dyn RouteTable>,
    generator: Arc<dyn ResponseGenerator>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl Interceptor {
    pub fn new(
        config: Arc<FakerConfig>,
        routes: Arc<dyn RouteTable>,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Self {
        Self {
            config,
            routes,
            generator,
            metrics: None,
        }
    }

    /// Count decisions and mock failures in `metrics`.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &FakerConfig {
        &self.config
    }

    /// Returns the mock response, or `None` when the request should reach
    /// the real application.
    pub fn intercept<B>(&self, request: &Request<B>) -> Option<Response> {
        // Statically disabled: behave as if not installed.
        if !self.config.enabled {
            return None;
        }

        let method = request.method();
        let path = request.uri().path();
        let mode = resolve_mode(&self.config, request.headers());
        let decision = decide(mode, self.routes.as_ref(), path, method);

        log_request_intercepted!(
            decision = decision.as_str(),
            method = %method,
            path = path,
            hijack = mode.hijack,
            "request intercepted"
        );
        if let Some(metrics) = &self.metrics {
            metrics.record_decision(decision.into(), method.as_str());
        }

        match decision {
            Decision::Passthrough => None,
            Decision::Mocked => Some(self.mock(request)),
        }
    }

    fn mock<B>(&self, request: &Request<B>) -> Response {
        let cors = cors_headers(request.headers().get(ORIGIN));

        if request.method() == Method::OPTIONS {
            return with_headers(StatusCode::OK, cors, Body::empty());
        }

        let settings = resolve(&self.config, request.headers(), request.method());
        match self.build_mock(request, &settings, cors) {
            Ok(response) => response,
            Err(err) => {
                log_mock_error!(
                    method = %request.method(),
                    path = request.uri().path(),
                    reason = err.reason(),
                    error = %err,
                    "failed to build mock response"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_mock_error(err.reason());
                }
                ProblemDetails::from(&err).into_response()
            }
        }
    }

    fn build_mock<B>(
        &self,
        request: &Request<B>,
        settings: &ResolvedSettings,
        mut headers: HeaderMap,
    ) -> Result<Response, FakerError> {
        let status = settings.response_code.clone()?;
        let status_code = StatusCode::from_u16(status)
            .map_err(|_| ResolveError::InvalidStatus(i64::from(status)))?;
        let operation = request.method().as_str().to_ascii_lowercase();

        let body = self.generator.generate(&MockRequest {
            schema: &self.config.schema,
            path: request.uri().path(),
            operation: &operation,
            status,
            constraints: &settings.constraints,
            seed: settings.seed,
        })?;

        if forbids_body(status_code) {
            return Ok(with_headers(status_code, headers, Body::empty()));
        }

        let bytes = serde_json::to_vec(&body)?;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(with_headers(status_code, headers, Body::from(bytes)))
    }
}

/// 1xx, 204 and 304 responses never carry a body.
fn forbids_body(status: StatusCode) -> bool {
    status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

fn with_headers(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Installs the interceptor in front of a service.
#[derive(Clone)]
pub struct FakerLayer {
    interceptor: Arc<Interceptor>,
}

impl FakerLayer {
    pub fn new(interceptor: Interceptor) -> Self {
        Self {
            interceptor: Arc::new(interceptor),
        }
    }
}

impl<S> Layer<S> for FakerLayer {
    type Service = FakerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FakerService {
            inner,
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

/// Service produced by [`FakerLayer`].
#[derive(Clone)]
pub struct FakerService<S> {
    inner: S,
    interceptor: Arc<Interceptor>,
}

impl<S, B> Service<Request<B>> for FakerService<S>
where
    S: Service<Request<B>, Response = Response>,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        match self.interceptor.intercept(&request) {
            Some(response) => Either::Left(future::ready(Ok(response))),
            None => Either::Right(self.inner.call(request)),
        }
    }
}
