use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// Key used for problems that belong to the whole object rather than a field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// A single validation problem.
///
/// `location` is where the data came from (`query`, `body`, `path`, `response`);
/// `field` is the dotted path inside it (`c.v`, `items.1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub location: String,
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.location, self.field, self.message)
    }
}

/// Every validation problem found for one request (or one response value).
///
/// Collected rather than short-circuited, so callers see all problems at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    issues: Vec<ValidationIssue>,
}

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(
        location: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let mut errors = Self::new();
        errors.push(ValidationIssue::new(location, field, message));
        errors
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: FieldErrors) {
        self.issues.extend(other.issues);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter()
    }

    /// Whether any issue was reported for `field` (dotted path).
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    /// Messages reported for `field`, in the order they were found.
    #[must_use]
    pub fn messages_for(&self, field: &str) -> Vec<&str> {
        self.issues
            .iter()
            .filter(|i| i.field == field)
            .map(|i| i.message.as_str())
            .collect()
    }

    /// The `errors` array of a 400 response body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!(self.issues)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

impl IntoIterator for FieldErrors {
    type Item = ValidationIssue;
    type IntoIter = std::vec::IntoIter<ValidationIssue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_and_renders() {
        let mut errors = FieldErrors::single("query", "name", "This field is required.");
        errors.push(ValidationIssue::new("query", "age", "A valid integer is required."));
        assert_eq!(errors.len(), 2);
        assert!(errors.has_field("name"));
        assert_eq!(errors.messages_for("age"), vec!["A valid integer is required."]);
        assert_eq!(
            errors.to_string(),
            "[query] name: This field is required.; [query] age: A valid integer is required."
        );
        assert_eq!(
            errors.to_json()[0],
            json!({ "location": "query", "field": "name", "message": "This field is required." })
        );
    }
}
