//! Merge static configuration with per-request header overrides.
//!
//! Every header is optional and, when present, wins over the static value.
//! Headers are parsed independently of each other. Resolution runs in two
//! steps: [`resolve_mode`] reads the enabled and hijack flags for every
//! request, [`resolve`] reads the rest only once a mock is being built.

use axum::http::{HeaderMap, Method};
use swagger_faker_generator::Constraints;
use swagger_faker_telemetry::log_override_coerced;

use crate::config::FakerConfig;
use crate::error::ResolveError;

pub const HEADER_ENABLED: &str = "x-swagger-faker-enabled";
pub const HEADER_HIJACK: &str = "x-swagger-faker-hijack";
pub const HEADER_SEED: &str = "x-swagger-faker-seed";
pub const HEADER_RESPONSE_CODE: &str = "x-swagger-faker-response-code";
pub const HEADER_MAX_ITEMS: &str = "x-swagger-faker-max-items";
pub const HEADER_MIN_ITEMS: &str = "x-swagger-faker-min-items";
pub const HEADER_UNIQUE_ITEMS: &str = "x-swagger-faker-unique-items";
pub const HEADER_MULTIPLE_OF: &str = "x-swagger-faker-multiple-of";
pub const HEADER_MAXIMUM: &str = "x-swagger-faker-maximum";
pub const HEADER_MINIMUM: &str = "x-swagger-faker-minimum";
pub const HEADER_CHANCE_REQUIRED: &str = "x-swagger-faker-chance-required";
pub const HEADER_MAX_LENGTH: &str = "x-swagger-faker-max-length";
pub const HEADER_MIN_LENGTH: &str = "x-swagger-faker-min-length";

/// Values read from the override headers of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub seed: Option<i64>,
    pub response_code: Option<i64>,
    pub max_items: Option<i64>,
    pub min_items: Option<i64>,
    pub unique_items: Option<bool>,
    pub multiple_of: Option<i64>,
    pub maximum: Option<i64>,
    pub minimum: Option<i64>,
    pub chance_required: Option<i64>,
    pub max_length: Option<i64>,
    pub min_length: Option<i64>,
}

impl Overrides {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            seed: integer(headers, HEADER_SEED),
            response_code: integer(headers, HEADER_RESPONSE_CODE),
            max_items: integer(headers, HEADER_MAX_ITEMS),
            min_items: integer(headers, HEADER_MIN_ITEMS),
            unique_items: flag(headers, HEADER_UNIQUE_ITEMS),
            multiple_of: integer(headers, HEADER_MULTIPLE_OF),
            maximum: integer(headers, HEADER_MAXIMUM),
            minimum: integer(headers, HEADER_MINIMUM),
            chance_required: integer(headers, HEADER_CHANCE_REQUIRED),
            max_length: integer(headers, HEADER_MAX_LENGTH),
            min_length: integer(headers, HEADER_MIN_LENGTH),
        }
    }
}

/// Whether the interceptor acts on a request, and whether it skips the
/// route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub enabled: bool,
    pub hijack: bool,
}

/// Read the enabled and hijack headers. No other header is looked at.
pub fn resolve_mode(config: &FakerConfig, headers: &HeaderMap) -> Mode {
    Mode {
        // An absent header leaves the (already enabled) interceptor on.
        enabled: flag(headers, HEADER_ENABLED).unwrap_or(true),
        hijack: flag(headers, HEADER_HIJACK).unwrap_or(config.hijack),
    }
}

/// Generation settings for one mocked request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    /// Zero when neither the header nor the config sets one.
    pub seed: i64,
    /// Fails for methods without a configured default unless the
    /// response-code header was sent.
    pub response_code: Result<u16, ResolveError>,
    pub constraints: Constraints,
}

/// Resolve the generation settings for a mocked request.
pub fn resolve(config: &FakerConfig, headers: &HeaderMap, method: &Method) -> ResolvedSettings {
    apply(config, &Overrides::from_headers(headers), method)
}

/// Apply already-parsed overrides on top of `config`.
pub fn apply(config: &FakerConfig, overrides: &Overrides, method: &Method) -> ResolvedSettings {
    let operation = method.as_str().to_ascii_lowercase();

    let response_code = overrides
        .response_code
        .or_else(|| config.default_status(&operation))
        .ok_or_else(|| ResolveError::UnsupportedMethod(method.as_str().to_string()))
        .and_then(validate_status);

    let base = config.constraints();
    let constraints = Constraints {
        max_items: overrides.max_items.unwrap_or(base.max_items),
        min_items: overrides.min_items.unwrap_or(base.min_items),
        unique_items: overrides.unique_items.unwrap_or(base.unique_items),
        multiple_of: overrides.multiple_of.unwrap_or(base.multiple_of),
        maximum: overrides.maximum.unwrap_or(base.maximum),
        minimum: overrides.minimum.unwrap_or(base.minimum),
        chance_required: overrides.chance_required.unwrap_or(base.chance_required),
        max_length: overrides.max_length.unwrap_or(base.max_length),
        min_length: overrides.min_length.unwrap_or(base.min_length),
    };

    ResolvedSettings {
        seed: overrides.seed.or(config.seed).unwrap_or(0),
        response_code,
        constraints,
    }
}

fn validate_status(code: i64) -> Result<u16, ResolveError> {
    u16::try_from(code)
        .ok()
        .filter(|status| (100..=999).contains(status))
        .ok_or(ResolveError::InvalidStatus(code))
}

/// `"true"` is true; any other present value is false.
fn flag(headers: &HeaderMap, name: &str) -> Option<bool> {
    headers.get(name).map(|value| value.as_bytes() == b"true")
}

/// Present but unparseable values read as zero.
fn integer(headers: &HeaderMap, name: &str) -> Option<i64> {
    let value = headers.get(name)?;
    let raw = String::from_utf8_lossy(value.as_bytes());
    match raw.trim().parse::<i64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log_override_coerced!(header = name, value = %raw, "malformed integer override read as 0");
            Some(0)
        }
    }
}
