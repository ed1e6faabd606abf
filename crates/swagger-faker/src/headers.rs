//! CORS headers attached to every mocked response.

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_MAX_AGE, ALLOW,
    },
    HeaderMap, HeaderName, HeaderValue,
};

pub const ALLOWED_HEADERS: &str = "Authorization, Content-Type";
pub const ALLOWED_METHODS: &str = "GET, POST, PATCH, PUT, DELETE";
pub const MAX_AGE: &str = "86400";

/// Marker header telling clients the response was produced by the faker.
pub const X_STATUS_CODE: HeaderName = HeaderName::from_static("x-status-code");

/// Build the CORS header set, echoing `origin` when the request sent one.
pub fn cors_headers(origin: Option<&HeaderValue>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(6);
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    if let Some(origin) = origin {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
    }
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
    headers.insert(ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
    headers.insert(X_STATUS_CODE, HeaderValue::from_static("200"));
    headers
}
