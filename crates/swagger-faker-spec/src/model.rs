use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use swagger_faker_router::{normalize_path, RouteMatch, Router};

use crate::error::SpecError;

/// Maximum number of `$ref` hops followed before giving up on a cycle.
const MAX_REF_HOPS: usize = 32;

/// Detected document flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecFormat {
    /// Swagger 2.0 (`swagger: "2.0"`).
    Swagger,
    /// OpenAPI 3.x (`openapi: "3.x.y"`).
    OpenApi,
}

/// A loaded API document.
#[derive(Debug)]
pub struct ApiDocument {
    /// Format detected from the root field.
    pub format: SpecFormat,
    /// The `swagger`/`openapi` version string.
    pub version: String,
    /// The `info.title` field.
    pub title: String,
    /// Path prefix every operation is served under (`/` when none).
    pub base_path: String,
    /// Every operation declared under `paths`.
    pub operations: Vec<Operation>,
    /// The raw document, kept for `$ref` resolution.
    pub(crate) root: Value,
    /// Path templates to operation indices.
    pub(crate) routes: Router<usize>,
}

/// One path + method pair.
#[derive(Debug, Clone, Serialize)]
pub struct Operation {
    /// Path template as written in the document (e.g. `/pets/{petId}`).
    pub path: String,
    /// Uppercase HTTP method.
    pub method: String,
    pub operation_id: Option<String>,
    /// Responses keyed by status code, range (`2XX`) or `default`.
    pub responses: BTreeMap<String, ResponseSpec>,
}

/// A single documented response.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResponseSpec {
    pub description: Option<String>,
    /// JSON schema of the body, if the response has one.
    pub schema: Option<Value>,
}

impl ApiDocument {
    /// Find the operation serving a concrete request path.
    ///
    /// `operation` is the lower-cased method name. The document's base path
    /// is stripped from `path` before matching.
    pub fn find_operation(&self, path: &str, operation: &str) -> Option<&Operation> {
        let relative = self.strip_base_path(path);
        match self.routes.lookup(&relative, operation) {
            RouteMatch::Found { value, .. } => self.operations.get(*value),
            RouteMatch::MethodNotAllowed { .. } | RouteMatch::NotFound => None,
        }
    }

    /// Pick the response documented for `status`.
    ///
    /// Exact code first, then the range key (`2XX`), then `default`.
    pub fn response_for<'a>(&self, operation: &'a Operation, status: u16) -> Option<&'a ResponseSpec> {
        let exact = status.to_string();
        let range = format!("{}XX", status / 100);

        operation
            .responses
            .get(&exact)
            .or_else(|| {
                operation
                    .responses
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(&range))
                    .map(|(_, response)| response)
            })
            .or_else(|| operation.responses.get("default"))
    }

    /// Resolve a local `$ref` such as `#/definitions/Pet`, following chains
    /// of references.
    pub fn resolve_ref(&self, reference: &str) -> Result<&Value, SpecError> {
        resolve_pointer(&self.root, reference)
    }

    fn strip_base_path(&self, path: &str) -> String {
        let normalized = normalize_path(path);
        if self.base_path == "/" {
            return normalized;
        }

        match normalized.strip_prefix(&self.base_path) {
            Some("") => "/".to_string(),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => normalized,
        }
    }
}

/// Follow a chain of local `$ref`s starting at `reference` inside `root`.
pub(crate) fn resolve_pointer<'a>(root: &'a Value, reference: &str) -> Result<&'a Value, SpecError> {
    let mut current = reference;
    for _ in 0..MAX_REF_HOPS {
        let target = current
            .strip_prefix('#')
            .and_then(|pointer| root.pointer(pointer))
            .ok_or_else(|| SpecError::UnresolvedRef(current.to_string()))?;

        match target.get("$ref").and_then(Value::as_str) {
            Some(next) => current = next,
            None => return Ok(target),
        }
    }

    Err(SpecError::UnresolvedRef(format!(
        "{} (reference cycle)",
        reference
    )))
}
