use thiserror::Error;

/// Errors produced while loading or querying an API document.
#[derive(Debug, Error)]
pub enum SpecError {
    /// Neither `swagger: "2.0"` nor `openapi: "3.x"` at the root.
    #[error("not a Swagger 2.0 or OpenAPI 3.x document")]
    UnknownFormat,

    /// YAML/JSON syntax error.
    #[error("parse error: {0}")]
    Parse(String),

    /// A `$ref` that does not point inside the document.
    #[error("unresolved $ref: {0}")]
    UnresolvedRef(String),

    /// The document parsed but its structure is wrong.
    #[error("invalid document: {0}")]
    Schema(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
