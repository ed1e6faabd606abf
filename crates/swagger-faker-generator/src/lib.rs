//! Schema-driven fake response generation.
//!
//! The interceptor only knows the [`ResponseGenerator`] trait: hand it a
//! [`MockRequest`] (schema reference, path, operation, status, constraints,
//! seed) and get back a JSON value. [`SchemaGenerator`] is the stock
//! implementation that walks the response schema of a loaded Swagger/OpenAPI
//! document.

pub mod constraints;
pub mod error;
pub mod faker;

pub use constraints::Constraints;
pub use error::GenerateError;
pub use faker::Faker;

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value};
use swagger_faker_spec::ApiDocument;

/// Inputs for one generated response.
#[derive(Debug, Clone, Copy)]
pub struct MockRequest<'a> {
    /// Reference to the API document (the configured `schema` value).
    pub schema: &'a str,
    /// Request path, e.g. `/pets/12`.
    pub path: &'a str,
    /// Lower-cased HTTP method.
    pub operation: &'a str,
    pub status: u16,
    pub constraints: &'a Constraints,
    /// RNG seed. Equal seeds and inputs give equal bodies.
    pub seed: i64,
}

/// Produces a fake response body for a request.
pub trait ResponseGenerator: Send + Sync {
    fn generate(&self, request: &MockRequest<'_>) -> Result<Value, GenerateError>;
}

/// Generator backed by loaded API documents, keyed by schema reference.
#[derive(Debug, Default)]
pub struct SchemaGenerator {
    documents: HashMap<String, ApiDocument>,
}

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already parsed document.
    pub fn with_document(mut self, reference: impl Into<String>, document: ApiDocument) -> Self {
        self.documents.insert(reference.into(), document);
        self
    }

    pub fn document(&self, reference: &str) -> Option<&ApiDocument> {
        self.documents.get(reference)
    }
}

impl ResponseGenerator for SchemaGenerator {
    fn generate(&self, request: &MockRequest<'_>) -> Result<Value, GenerateError> {
        let document = self
            .documents
            .get(request.schema)
            .ok_or_else(|| GenerateError::UnknownSchema(request.schema.to_string()))?;

        let operation = document
            .find_operation(request.path, request.operation)
            .ok_or_else(|| GenerateError::UnknownOperation {
                path: request.path.to_string(),
                operation: request.operation.to_string(),
            })?;

        let response = document.response_for(operation, request.status).ok_or_else(|| {
            GenerateError::UnknownResponse {
                path: request.path.to_string(),
                operation: request.operation.to_string(),
                status: request.status,
            }
        })?;

        let Some(schema) = &response.schema else {
            return Ok(Value::Object(Map::new()));
        };

        // Negative seeds reinterpret their bits.
        let rng = StdRng::seed_from_u64(request.seed as u64);
        Faker::new(document, request.constraints, rng).fake(schema)
    }
}
