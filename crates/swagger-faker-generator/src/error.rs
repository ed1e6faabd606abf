use swagger_faker_spec::SpecError;
use thiserror::Error;

/// Errors produced while generating a fake response.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// No document was loaded under this schema reference.
    #[error("unknown schema reference: {0}")]
    UnknownSchema(String),

    /// The document has no operation for this path and method.
    #[error("no operation '{operation}' for path '{path}' in the API document")]
    UnknownOperation { path: String, operation: String },

    /// The operation documents no response for this status (and no `default`).
    #[error("operation '{operation} {path}' documents no response for status {status}")]
    UnknownResponse {
        path: String,
        operation: String,
        status: u16,
    },

    /// Loading the document or resolving a `$ref` failed.
    #[error(transparent)]
    Spec(#[from] SpecError),
}
