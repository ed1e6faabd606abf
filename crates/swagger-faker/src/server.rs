//! Standalone mock server.
//!
//! The only real routes are the health and metrics endpoints; everything
//! else falls through to the interceptor.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::IntoResponse,
    routing::get,
    Json,
};
use serde::Serialize;
use swagger_faker_generator::ResponseGenerator;
use swagger_faker_router::Router;
use swagger_faker_telemetry::{
    log_listening, prometheus::render_metrics, MetricsRegistry, PROMETHEUS_CONTENT_TYPE,
};
use tokio::net::TcpListener;
use tower::{make::Shared, Layer};

use crate::config::FakerConfig;
use crate::interceptor::{FakerLayer, FakerService, Interceptor};

pub const HEALTH_PATH: &str = "/__swagger_faker/health";
pub const METRICS_PATH: &str = "/__swagger_faker/metrics";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// GET /__swagger_faker/health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /__swagger_faker/metrics
async fn metrics(State(registry): State<Arc<MetricsRegistry>>) -> impl IntoResponse {
    ([(CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], render_metrics(&registry))
}

/// Route table mirroring the axum routes registered in [`build_app`].
fn real_routes() -> Router<()> {
    let mut routes = Router::new();
    routes.insert(HEALTH_PATH, "GET", ());
    routes.insert(METRICS_PATH, "GET", ());
    routes
}

/// Build the standalone application: the built-in endpoints wrapped by the
/// interceptor.
pub fn build_app(
    config: Arc<FakerConfig>,
    generator: Arc<dyn ResponseGenerator>,
    registry: Arc<MetricsRegistry>,
) -> FakerService<axum::Router> {
    let app = axum::Router::new()
        .route(HEALTH_PATH, get(health_check))
        .route(METRICS_PATH, get(metrics))
        .with_state(Arc::clone(&registry));

    let interceptor =
        Interceptor::new(config, Arc::new(real_routes()), generator).with_metrics(registry);
    FakerLayer::new(interceptor).layer(app)
}

/// Bind `listen_addr` and serve `app` until the process exits.
pub async fn run(listen_addr: SocketAddr, app: FakerService<axum::Router>) -> std::io::Result<()> {
    let listener = TcpListener::bind(listen_addr).await?;
    log_listening!(address = %listen_addr, "mock server listening");

    axum::serve(listener, Shared::new(app)).await
}
