//! HTTP requests and responses as plain data, plus the pure functions that
//! build and read them.
//!
//! # Design
//! The core never opens a socket. `build_request` turns a path, options and an
//! optional access token into an `HttpRequest`; a `Transport` executes it and
//! hands back an `HttpResponse`, which `parse_body` reads. Keeping these steps
//! free of I/O lets the token-refresh logic in `HttpClient` be tested against
//! scripted responses.
//!
//! All fields use owned types (`String`, `Vec`) so values move freely across
//! task and thread boundaries.

use std::fmt;

use serde_json::Value;

use crate::error::ApiError;

/// Fixed path of the token refresh endpoint, relative to the base URL.
pub const REFRESH_PATH: &str = "/auth/refresh";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute: base URL plus the normalized path.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Per-call options for `HttpClient::request`.
///
/// `body` is any JSON value; it is serialized and sent with a JSON
/// content type when present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Option<Value>) -> Self {
        Self {
            method: HttpMethod::Post,
            body,
            headers: Vec::new(),
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: HttpMethod::Put,
            body: Some(body),
            headers: Vec::new(),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: HttpMethod::Delete,
            ..Self::default()
        }
    }

    /// Serialize `payload` into the request body.
    pub fn with_json<T: serde::Serialize>(mut self, payload: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Prefix `path` with `/` unless it already starts with one. An empty path
/// addresses the base URL itself.
pub fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Build the request for one attempt of a logical call.
///
/// The bearer header is attached only when `access_token` is present and
/// non-empty; an unauthenticated request is simply sent without it.
pub fn build_request(
    base_url: &str,
    path: &str,
    options: &RequestOptions,
    access_token: Option<&str>,
) -> Result<HttpRequest, ApiError> {
    let mut headers = options.headers.clone();

    if let Some(token) = access_token.filter(|t| !t.is_empty()) {
        set_header(&mut headers, "authorization", format!("Bearer {token}"));
    }

    let body = match &options.body {
        Some(value) => {
            set_header(&mut headers, "content-type", "application/json".to_string());
            Some(serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))?)
        }
        None => None,
    };

    Ok(HttpRequest {
        method: options.method,
        url: format!("{base_url}{}", normalize_path(path)),
        headers,
        body,
    })
}

/// Build the `POST /auth/refresh` request that exchanges `refresh_token` for a
/// new access token.
pub fn build_refresh_request(base_url: &str, refresh_token: &str) -> HttpRequest {
    let body = serde_json::json!({ "refreshToken": refresh_token });
    HttpRequest {
        method: HttpMethod::Post,
        url: format!("{base_url}{REFRESH_PATH}"),
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body.to_string()),
    }
}

/// Read a response body: `204` or an empty body yields `Null`, JSON is parsed,
/// anything else is returned as a JSON string holding the raw text.
pub fn parse_body(response: &HttpResponse) -> Value {
    if response.status == 204 || response.body.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&response.body).unwrap_or_else(|_| Value::String(response.body.clone()))
}

/// Replace any same-named header (case-insensitive) with `value`.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://localhost:8000/api/v1";

    #[test]
    fn get_without_token_has_no_headers() {
        let req = build_request(BASE, "/workouts", &RequestOptions::get(), None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:8000/api/v1/workouts");
        assert!(req.headers.is_empty());
        assert!(req.body.is_none());
    }

    #[test]
    fn token_becomes_bearer_header() {
        let req = build_request(BASE, "/me", &RequestOptions::get(), Some("abc")).unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer abc"));
    }

    #[test]
    fn empty_token_sends_no_authorization() {
        let req = build_request(BASE, "/me", &RequestOptions::get(), Some("")).unwrap();
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn body_is_serialized_with_json_content_type() {
        let options = RequestOptions::post(Some(json!({ "email": "a@b.c", "password": "pw" })));
        let req = build_request(BASE, "auth/login", &options, None).unwrap();
        assert_eq!(req.url, "http://localhost:8000/api/v1/auth/login");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["email"], "a@b.c");
    }

    #[test]
    fn caller_authorization_header_is_overridden() {
        let options = RequestOptions::get().with_header("Authorization", "Bearer stale");
        let req = build_request(BASE, "/me", &options, Some("fresh")).unwrap();
        let auth: Vec<_> = req
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth.len(), 1);
        assert_eq!(req.header("authorization"), Some("Bearer fresh"));
    }

    #[test]
    fn caller_headers_are_kept() {
        let options = RequestOptions::get().with_header("x-gym", "gym-1");
        let req = build_request(BASE, "/me", &options, None).unwrap();
        assert_eq!(req.header("X-Gym"), Some("gym-1"));
    }

    #[test]
    fn empty_path_targets_base_url() {
        let req = build_request(BASE, "", &RequestOptions::get(), None).unwrap();
        assert_eq!(req.url, BASE);
    }

    #[test]
    fn refresh_request_shape() {
        let req = build_refresh_request(BASE, "r-1");
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:8000/api/v1/auth/refresh");
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "refreshToken": "r-1" }));
    }

    #[test]
    fn parse_body_variants() {
        assert_eq!(parse_body(&HttpResponse::new(204, "ignored")), Value::Null);
        assert_eq!(parse_body(&HttpResponse::new(200, "")), Value::Null);
        assert_eq!(parse_body(&HttpResponse::new(200, r#"{"a":1}"#)), json!({ "a": 1 }));
        assert_eq!(
            parse_body(&HttpResponse::new(502, "bad gateway")),
            Value::String("bad gateway".to_string())
        );
    }

    #[test]
    fn success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(401, "").is_success());
    }
}
