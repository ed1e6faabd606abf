//! Swagger-faker request interceptor.
//!
//! A `tower` layer that sits in front of an application's router. Requests
//! with a real route pass through; requests without one (or every request,
//! in hijack mode) get a JSON body generated from a Swagger/OpenAPI
//! document. Per-request `x-swagger-faker-*` headers override the static
//! [`FakerConfig`].

pub mod config;
pub mod error;
pub mod headers;
pub mod interceptor;
pub mod resolve;
pub mod server;

pub use config::FakerConfig;
pub use error::{ConfigError, FakerError, ProblemDetails, ResolveError};
pub use interceptor::{
    decide, Decision, FakerLayer, FakerService, Interceptor, RouteLookup, RouteTable,
};
pub use resolve::{resolve, resolve_mode, Mode, Overrides, ResolvedSettings};

use std::path::Path;

use swagger_faker_generator::SchemaGenerator;
use swagger_faker_spec::parse_document_file;
use swagger_faker_telemetry::log_document_loaded;

/// Parse the document named by `config.schema` and register it with a
/// [`SchemaGenerator`] under that same reference.
///
/// Relative references are resolved against `config_dir`.
pub fn load_generator(config: &FakerConfig, config_dir: &Path) -> Result<SchemaGenerator, FakerError> {
    let path = config.schema_path(config_dir);
    let document = parse_document_file(&path)?;

    log_document_loaded!(
        schema = %config.schema,
        title = %document.title,
        format = ?document.format,
        operations = document.operations.len(),
        "API document loaded"
    );

    Ok(SchemaGenerator::new().with_document(config.schema.clone(), document))
}
