use super::request::HeaderVec;
use crate::validator::FieldErrors;
use anyhow::Context;
use http::{Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

/// Response produced by a view, before it is written to the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderVec,
    /// `None` for responses without a body (e.g. `204 No Content`)
    pub body: Option<Value>,
}

impl ApiResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        ApiResponse {
            status,
            headers: HeaderVec::new(),
            body,
        }
    }

    #[must_use]
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self::new(status, Some(body))
    }

    /// `{"detail": ...}` error body.
    #[must_use]
    pub fn error(status: StatusCode, detail: &str) -> Self {
        Self::json(status, json!({ "detail": detail }))
    }

    /// `400` listing every validation problem.
    #[must_use]
    pub fn validation_error(errors: &FieldErrors) -> Self {
        Self::json(
            StatusCode::BAD_REQUEST,
            json!({ "detail": "Invalid request.", "errors": errors.to_json() }),
        )
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::error(
            StatusCode::FORBIDDEN,
            "You do not have permission to perform this action.",
        )
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::error(StatusCode::NOT_FOUND, "Not found.")
    }

    #[must_use]
    pub fn method_not_allowed(method: &Method, allowed: &[Method]) -> Self {
        let allow: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        Self::error(
            StatusCode::METHOD_NOT_ALLOWED,
            &format!("Method \"{method}\" not allowed."),
        )
        .with_header("allow", allow.join(", "))
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase().as_str()), value.into()));
        self
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Convert into an `http::Response` with a JSON body.
    pub fn into_http(self) -> anyhow::Result<http::Response<Vec<u8>>> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(&**name, value.as_str());
        }
        let body = match self.body {
            Some(value) => {
                builder = builder.header(http::header::CONTENT_TYPE, "application/json");
                serde_json::to_vec(&value).context("Failed to encode response body")?
            }
            None => Vec::new(),
        };
        builder.body(body).context("Failed to build HTTP response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidationIssue;

    #[test]
    fn test_validation_error_body() {
        let mut errors = FieldErrors::new();
        errors.push(ValidationIssue::new("query", "name", "This field is required."));
        let res = ApiResponse::validation_error(&errors);
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        let body = res.body.unwrap();
        assert_eq!(body["errors"][0]["field"], "name");
    }

    #[test]
    fn test_method_not_allowed_sets_allow() {
        let res = ApiResponse::method_not_allowed(&Method::DELETE, &[Method::GET, Method::POST]);
        assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.get_header("Allow"), Some("GET, POST"));
    }

    #[test]
    fn test_into_http() {
        let res = ApiResponse::json(StatusCode::OK, json!({ "length": 5 }))
            .into_http()
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "application/json");
        assert_eq!(res.body().as_slice(), br#"{"length":5}"#);

        let res = ApiResponse::new(StatusCode::NO_CONTENT, None)
            .into_http()
            .unwrap();
        assert!(res.body().is_empty());
    }
}
