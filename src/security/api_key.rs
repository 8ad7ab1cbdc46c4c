use super::Permission;
use crate::server::ApiRequest;

/// Static API key check.
///
/// Accepts the key from the configured header (default `x-api-key`) or from
/// `Authorization: Bearer <key>`.
#[derive(Debug, Clone)]
pub struct ApiKeyPermission {
    key: String,
    header_name: String,
}

impl ApiKeyPermission {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header_name: "x-api-key".to_string(),
        }
    }

    /// Configure the header name to look for the API key
    ///
    /// Default: `x-api-key`
    #[must_use]
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into().to_ascii_lowercase();
        self
    }

    fn extract_key<'a>(&self, req: &'a ApiRequest) -> Option<&'a str> {
        req.get_header(&self.header_name).or_else(|| {
            req.get_header("authorization")
                .and_then(|h| h.strip_prefix("Bearer "))
        })
    }
}

impl Permission for ApiKeyPermission {
    fn name(&self) -> &str {
        "ApiKeyPermission"
    }

    fn has_permission(&self, req: &ApiRequest) -> bool {
        self.extract_key(req).is_some_and(|k| k == self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_bearer() {
        let perm = ApiKeyPermission::new("secret").header_name("X-Token");
        assert!(perm.has_permission(&ApiRequest::get("/").header("x-token", "secret")));
        assert!(perm.has_permission(&ApiRequest::get("/").header("Authorization", "Bearer secret")));
        assert!(!perm.has_permission(&ApiRequest::get("/").header("x-token", "wrong")));
        assert!(!perm.has_permission(&ApiRequest::get("/")));
    }
}
