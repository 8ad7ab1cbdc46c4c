use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// ULID correlating the log events of one request.
///
/// Taken from an incoming `x-request-id` header when it holds a valid ULID,
/// generated otherwise, and echoed back on the HTTP response.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Look up [`REQUEST_ID_HEADER`] among lowercased header pairs.
    #[must_use]
    pub fn from_headers<K: AsRef<str>>(headers: &[(K, String)]) -> Self {
        let value = headers
            .iter()
            .find(|(k, _)| k.as_ref() == REQUEST_ID_HEADER)
            .map(|(_, v)| v.trim());
        match value.map(str::parse::<RequestId>) {
            Some(Ok(id)) => id,
            _ => Self::new(),
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_headers() {
        let id = RequestId::new();
        let headers = vec![("x-request-id".to_string(), format!(" {id} "))];
        assert_eq!(RequestId::from_headers(&headers), id);

        let bogus = vec![("x-request-id".to_string(), "not-a-ulid".to_string())];
        assert_ne!(RequestId::from_headers(&bogus), id);

        let none: Vec<(String, String)> = Vec::new();
        assert_ne!(RequestId::from_headers(&none), id);
    }
}
