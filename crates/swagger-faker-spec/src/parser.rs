use std::collections::BTreeMap;
use std::path::Path;

use serde_json::{Map, Value};
use swagger_faker_router::{normalize_path, Router};

use crate::error::SpecError;
use crate::model::{resolve_pointer, ApiDocument, Operation, ResponseSpec, SpecFormat};

/// HTTP methods recognized as operation keys inside a path item.
const HTTP_METHODS: &[&str] = &[
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Parse a Swagger 2.0 or OpenAPI 3.x document from YAML or JSON.
pub fn parse_document(input: &str) -> Result<ApiDocument, SpecError> {
    // JSON is valid YAML, one parser covers both.
    let root: Value = serde_yaml::from_str(input).map_err(|e| SpecError::Parse(e.to_string()))?;

    let root_obj = root
        .as_object()
        .ok_or_else(|| SpecError::Parse("document root must be an object".into()))?;

    let (format, version) = detect_format(root_obj)?;

    let title = root_obj
        .get("info")
        .and_then(|info| info.get("title"))
        .and_then(Value::as_str)
        .ok_or_else(|| SpecError::Schema("missing 'info.title'".into()))?
        .to_string();

    let base_path = match format {
        SpecFormat::Swagger => root_obj
            .get("basePath")
            .and_then(Value::as_str)
            .map(normalize_path),
        SpecFormat::OpenApi => first_server_path(root_obj),
    }
    .unwrap_or_else(|| "/".to_string());

    let operations = parse_paths(&root, format)?;

    let mut routes = Router::new();
    for (index, op) in operations.iter().enumerate() {
        routes.insert(&op.path, &op.method, index);
    }

    Ok(ApiDocument {
        format,
        version,
        title,
        base_path,
        operations,
        root,
        routes,
    })
}

/// Parse a document from a file path.
pub fn parse_document_file(path: &Path) -> Result<ApiDocument, SpecError> {
    let content = std::fs::read_to_string(path)?;
    parse_document(&content)
}

fn detect_format(root: &Map<String, Value>) -> Result<(SpecFormat, String), SpecError> {
    if let Some(version) = root.get("swagger").and_then(Value::as_str) {
        if version != "2.0" {
            return Err(SpecError::Schema(format!(
                "unsupported Swagger version: {} (only 2.0 supported)",
                version
            )));
        }
        return Ok((SpecFormat::Swagger, version.to_string()));
    }

    if let Some(version) = root.get("openapi").and_then(Value::as_str) {
        if !version.starts_with("3.") {
            return Err(SpecError::Schema(format!(
                "unsupported OpenAPI version: {} (only 3.x supported)",
                version
            )));
        }
        return Ok((SpecFormat::OpenApi, version.to_string()));
    }

    Err(SpecError::UnknownFormat)
}

/// Path component of the first `servers[].url`, e.g. `/v1` for
/// `https://api.example.com/v1`.
fn first_server_path(root: &Map<String, Value>) -> Option<String> {
    let url = root
        .get("servers")?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()?;

    let without_scheme = match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|idx| &rest[idx..]).unwrap_or("/"),
        None => url,
    };
    Some(normalize_path(without_scheme))
}

fn parse_paths(root: &Value, format: SpecFormat) -> Result<Vec<Operation>, SpecError> {
    let mut operations = Vec::new();

    let Some(paths) = root.get("paths").and_then(Value::as_object) else {
        return Ok(operations);
    };

    for (path, item) in paths {
        let item = item.as_object().ok_or_else(|| {
            SpecError::Schema(format!("path item for '{}' must be an object", path))
        })?;

        for method in HTTP_METHODS {
            let Some(op) = item.get(*method) else {
                continue;
            };
            let op = op.as_object().ok_or_else(|| {
                SpecError::Schema(format!(
                    "operation {} {} must be an object",
                    method.to_uppercase(),
                    path
                ))
            })?;

            operations.push(Operation {
                path: path.clone(),
                method: method.to_uppercase(),
                operation_id: op
                    .get("operationId")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                responses: parse_responses(root, op, format)?,
            });
        }
    }

    Ok(operations)
}

/// Response objects may themselves be `$ref`s (`#/responses/...`,
/// `#/components/responses/...`); those are resolved here.
fn parse_responses(
    root: &Value,
    op: &Map<String, Value>,
    format: SpecFormat,
) -> Result<BTreeMap<String, ResponseSpec>, SpecError> {
    let Some(responses) = op.get("responses").and_then(Value::as_object) else {
        return Ok(BTreeMap::new());
    };

    let mut parsed = BTreeMap::new();
    for (code, response) in responses {
        let response = match response.get("$ref").and_then(Value::as_str) {
            Some(reference) => resolve_pointer(root, reference)?,
            None => response,
        };
        let Some(response) = response.as_object() else {
            continue;
        };

        let schema = match format {
            SpecFormat::Swagger => response.get("schema").cloned(),
            SpecFormat::OpenApi => openapi_response_schema(response),
        };
        parsed.insert(
            code.clone(),
            ResponseSpec {
                description: response
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                schema,
            },
        );
    }

    Ok(parsed)
}

/// `content.<media>.schema`, preferring `application/json`, then any JSON
/// media type, then whatever comes first.
fn openapi_response_schema(response: &Map<String, Value>) -> Option<Value> {
    let content = response.get("content")?.as_object()?;

    let media = content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| media_type.contains("json"))
                .map(|(_, media)| media)
        })
        .or_else(|| content.values().next())?;

    media.get("schema").cloned()
}
