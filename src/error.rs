use crate::validator::FieldErrors;
use std::fmt;

/// Misconfiguration detected while building a view or mounting it on an [`crate::Api`].
///
/// These are setup faults: they are returned before any request is served and are
/// never turned into HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionError {
    /// A view was declared without any HTTP method
    NoMethods,
    /// The same method is listed twice, or is already served by a stacked handler
    OverlappingMethods { method: String },
    /// A handler argument does not declare where its data comes from
    Unclassified { position: usize, type_name: String },
    /// More than one argument claims the same request location
    DuplicateClassification { classification: &'static str },
    /// A classified argument or the response wraps something other than a dataclass
    NotADataclass { type_name: String },
    /// Two different dataclasses would share one schema component name
    NameInUse {
        name: String,
        existing: String,
        new: String,
    },
    /// Permissions given to a handler stacked with `ApiView::add`
    PermissionsOnStackedView,
    /// The URL pattern is already mounted
    DuplicateRoute { pattern: String },
    /// The URL pattern could not be compiled
    InvalidPattern { pattern: String, reason: String },
    /// `{captures}` in the pattern and the `Path<T>` fields disagree
    PathParameterMismatch { pattern: String, message: String },
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionError::NoMethods => write!(f, "at least one HTTP method is required"),
            CollectionError::OverlappingMethods { method } => {
                write!(f, "overlapping methods are not allowed (`{method}`)")
            }
            CollectionError::Unclassified {
                position,
                type_name,
            } => write!(
                f,
                "argument #{position} of type `{type_name}` has no classification; \
                 wrap it in `Query`, `Data` or `Path`, or take the `ApiRequest` itself"
            ),
            CollectionError::DuplicateClassification { classification } => {
                write!(f, "At most one `{classification}` parameter is allowed")
            }
            CollectionError::NotADataclass { type_name } => {
                write!(f, "`{type_name}` must be a dataclass")
            }
            CollectionError::NameInUse {
                name,
                existing,
                new,
            } => write!(
                f,
                "Name already in use: `{name}` refers to both `{existing}` and `{new}`"
            ),
            CollectionError::PermissionsOnStackedView => write!(
                f,
                "permissions are shared with the parent view; declare them on the view being extended"
            ),
            CollectionError::DuplicateRoute { pattern } => {
                write!(f, "route `{pattern}` is already mounted")
            }
            CollectionError::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern `{pattern}`: {reason}")
            }
            CollectionError::PathParameterMismatch { pattern, message } => {
                write!(f, "route `{pattern}`: {message}")
            }
        }
    }
}

impl std::error::Error for CollectionError {}

/// Failure while serving a request that is not the client's fault.
///
/// Client validation problems never show up here; they become `400` responses.
#[derive(Debug)]
pub enum ViewError {
    /// Error returned by the view function itself, passed through untouched
    Handler(anyhow::Error),
    /// The view returned data that does not match its declared response dataclass
    InvalidReturnValue(FieldErrors),
}

impl ViewError {
    /// The error returned by the view function, if that is what this is.
    #[must_use]
    pub fn handler_error(&self) -> Option<&anyhow::Error> {
        match self {
            ViewError::Handler(err) => Some(err),
            ViewError::InvalidReturnValue(_) => None,
        }
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::Handler(err) => write!(f, "{err}"),
            ViewError::InvalidReturnValue(issues) => {
                write!(f, "Invalid data returned from view: {issues}")
            }
        }
    }
}

impl std::error::Error for ViewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewError::Handler(err) => {
                let source: &(dyn std::error::Error + 'static) = err.as_ref();
                Some(source)
            }
            ViewError::InvalidReturnValue(issues) => Some(issues),
        }
    }
}
