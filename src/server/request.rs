use crate::ids::RequestId;
use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::sync::Arc;

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Ordered `(name, value)` pairs for path and query parameters.
///
/// Repeated names are kept; list-typed fields collect every occurrence, scalar
/// fields use the last one.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Header pairs with lowercased names.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Parsed request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs, still as strings
    Form(ParamVec),
    /// The body could not be decoded; holds the parser message
    Invalid(String),
}

/// Incoming request as seen by a view.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Taken from `x-request-id` when it holds a ULID, generated otherwise
    pub request_id: RequestId,
    pub method: Method,
    /// Path without the query string
    pub path: String,
    pub query_params: ParamVec,
    /// Captured by the router from `{name}` segments
    pub path_params: ParamVec,
    pub headers: HeaderVec,
    pub body: RequestBody,
}

impl ApiRequest {
    /// Build a request for `uri`, which may carry a query string.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, query),
            None => (uri, ""),
        };
        let path = if path.is_empty() { "/" } else { path };
        ApiRequest {
            request_id: RequestId::new(),
            method,
            path: path.to_string(),
            query_params: parse_query_params(query),
            path_params: ParamVec::new(),
            headers: HeaderVec::new(),
            body: RequestBody::Empty,
        }
    }

    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    #[must_use]
    pub fn put(uri: &str) -> Self {
        Self::new(Method::PUT, uri)
    }

    #[must_use]
    pub fn patch(uri: &str) -> Self {
        Self::new(Method::PATCH, uri)
    }

    #[must_use]
    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Attach a form-encoded body.
    #[must_use]
    pub fn form<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase().as_str()), value.into()));
        self
    }

    /// Get a query parameter by name (last occurrence wins).
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a path parameter by name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl<B: AsRef<[u8]>> From<http::Request<B>> for ApiRequest {
    fn from(req: http::Request<B>) -> Self {
        let (parts, body) = req.into_parts();

        let headers: HeaderVec = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (Arc::from(name.as_str()), v.to_string()))
            })
            .collect();

        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        let bytes = body.as_ref();
        let body = if bytes.is_empty() {
            RequestBody::Empty
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            RequestBody::Form(
                url::form_urlencoded::parse(bytes)
                    .map(|(k, v)| (Arc::from(&*k), v.into_owned()))
                    .collect(),
            )
        } else {
            match serde_json::from_slice(bytes) {
                Ok(value) => RequestBody::Json(value),
                Err(err) => RequestBody::Invalid(format!("JSON parse error - {err}")),
            }
        };

        let request_id = RequestId::from_headers(&headers);

        ApiRequest {
            request_id,
            method: parts.method,
            path: parts.uri.path().to_string(),
            query_params: parse_query_params(parts.uri.query().unwrap_or("")),
            path_params: ParamVec::new(),
            headers,
            body,
        }
    }
}

/// Parse a query string (without the leading `?`), URL-decoding names and values.
#[must_use]
pub fn parse_query_params(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(&*k), v.into_owned()))
        .collect()
}
