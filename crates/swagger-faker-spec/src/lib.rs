//! Swagger 2.0 and OpenAPI 3.x document loader.
//!
//! Reads YAML/JSON API descriptions, keeps every operation's response
//! schemas, and answers the questions the fake-data generator asks: which
//! operation serves this request path, which response describes this status
//! code, and what does this `$ref` point to.

pub mod error;
pub mod model;
pub mod parser;

pub use error::SpecError;
pub use model::{ApiDocument, Operation, ResponseSpec, SpecFormat};
pub use parser::{parse_document, parse_document_file};
