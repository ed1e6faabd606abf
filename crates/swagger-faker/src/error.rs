//! Error types and the RFC 9457 problem response sent when mocking fails.

use std::path::PathBuf;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use swagger_faker_generator::GenerateError;
use swagger_faker_spec::SpecError;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("'swagger_faker.schema' must name the API document")]
    MissingSchema,
}

/// Failures resolving the effective settings of a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No status is configured for this method and no override header was
    /// sent.
    #[error("no default response code for method {0}; send x-swagger-faker-response-code")]
    UnsupportedMethod(String),

    #[error("invalid response code: {0}")]
    InvalidStatus(i64),
}

/// Failures while building a mock response.
#[derive(Debug, Error)]
pub enum FakerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("failed to load API document: {0}")]
    Document(#[from] SpecError),

    #[error("failed to serialize mock body: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl FakerError {
    /// Short label for the `reason` metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            FakerError::Resolve(ResolveError::UnsupportedMethod(_)) => "unsupported_method",
            FakerError::Resolve(ResolveError::InvalidStatus(_)) => "invalid_status",
            FakerError::Generate(GenerateError::UnknownSchema(_)) => "unknown_schema",
            FakerError::Generate(GenerateError::UnknownOperation { .. }) => "unknown_operation",
            FakerError::Generate(GenerateError::UnknownResponse { .. }) => "unknown_response",
            FakerError::Generate(GenerateError::Spec(_)) => "schema",
            FakerError::Document(_) => "document",
            FakerError::Serialize(_) => "serialize",
        }
    }
}

/// RFC 9457 Problem Details response.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    /// Create a 500 Internal Server Error with details.
    pub fn internal_error_with_detail(detail: impl Into<String>) -> Self {
        Self {
            error_type: "urn:swagger-faker:error:mock-failed".into(),
            title: "Internal Server Error".into(),
            status: 500,
            detail: Some(detail.into()),
        }
    }
}

impl From<&FakerError> for ProblemDetails {
    fn from(err: &FakerError) -> Self {
        Self::internal_error_with_detail(err.to_string())
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = Json(&self).into_response();
        *response.status_mut() = status;
        response.headers_mut().insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        response
    }
}
