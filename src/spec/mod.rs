//! # Spec Module
//!
//! Generates the OpenAPI 3.1 document of an [`Api`] from the metadata its views
//! collected at registration.
//!
//! Per mounted view and method, the operation carries:
//!
//! - `operationId`, `summary` and `description` from the view declaration
//! - `in: path` parameters for the pattern's captures and `in: query`
//!   parameters for the fields of the `Query<T>` argument
//! - a `requestBody` for `Data<T>`, accepted as JSON or form-encoded
//! - the success response under the configured status, plus `400` when the
//!   view validates input and `403` (with `x-permissions`) when it has
//!   permissions
//!
//! Every dataclass reachable from a view appears once under
//! `components.schemas`. Routes mounted with [`Api::raw_route`] are left out.
//!
//! ```rust
//! use speccify::{Api, ApiConfig};
//!
//! let api = Api::new(ApiConfig::new("Empty", "0.0.1"));
//! let doc = api.openapi();
//! assert_eq!(doc["openapi"], "3.1.0");
//! assert_eq!(api.openapi_spec().unwrap().info.title, "Empty");
//! ```

mod build;
mod load;

pub use build::*;
pub use load::*;

use crate::router::Api;
use oas3::OpenApiV3Spec;
use serde_json::Value;

impl Api {
    /// The OpenAPI document as JSON.
    #[must_use]
    pub fn openapi(&self) -> Value {
        build_openapi(self)
    }

    /// The OpenAPI document as YAML.
    ///
    /// # Errors
    ///
    /// Only if serialization fails.
    pub fn openapi_yaml(&self) -> anyhow::Result<String> {
        to_yaml(&self.openapi())
    }

    /// The OpenAPI document parsed into the `oas3` model.
    ///
    /// # Errors
    ///
    /// If the generated document does not parse, which would be a bug.
    pub fn openapi_spec(&self) -> anyhow::Result<OpenApiV3Spec> {
        parse_spec(self.openapi())
    }
}
