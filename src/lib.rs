//! # speccify
//!
//! **speccify** turns plain Rust functions into API views whose request parsing,
//! validation, response serialization and [OpenAPI 3.1](https://spec.openapis.org/oas/v3.1.0)
//! description all come from the types in the function signature.
//!
//! ## Overview
//!
//! A view argument says where its data comes from by its wrapper type, and the
//! wrapped type is a *dataclass*: a struct deriving `serde` and [`Dataclass`].
//!
//! - [`Query<T>`] - the query string
//! - [`Data<T>`] - the request body (JSON or form-encoded)
//! - [`Path<T>`] - the captures of the route pattern
//! - [`ApiRequest`] - the raw request
//!
//! The function returns `anyhow::Result<R>` with `R` a dataclass ([`Empty`] when
//! there is nothing to say). Everything is checked once when the view is built;
//! a misdeclared view is a [`CollectionError`], never a failing request.
//!
//! ## Architecture
//!
//! - **[`dataclass`]** - field metadata, the [`Schema`] trait, [`Empty`]
//! - **[`serializer`]** - validation with aggregated errors, serialization
//! - **[`typed`]** - classification wrappers and the [`typed::Handler`] trait
//! - **[`dispatcher`]** - [`api_view`], [`ApiView`] and per-request dispatch
//! - **[`security`]** - the [`Permission`] trait and built-in permissions
//! - **[`router`]** - [`Api`]: URL patterns, routing, `500` mapping
//! - **[`spec`]** - OpenAPI document generation
//! - **[`server`]** - [`ApiRequest`] / [`ApiResponse`] and `http` conversions
//! - **[`config`]** / **[`logging`]** - [`ApiConfig`] and `tracing` setup
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Api as Api (router)
//!     participant View as ApiView
//!     participant Perm as Permissions
//!     participant Ser as Serializer
//!     participant Fn as View function
//!
//!     Client->>Api: GET /pets/7?verbose=true
//!     Api->>Api: Match pattern, inject path params
//!     alt No route
//!         Api-->>Client: 404
//!     end
//!     Api->>View: call(request)
//!     alt Method not served
//!         View-->>Client: 405 + Allow
//!     end
//!     View->>Perm: has_permission(request)
//!     alt Refused
//!         View-->>Client: 403
//!     end
//!     View->>Ser: validate Query / Data / Path
//!     alt Any field invalid
//!         View-->>Client: 400 with every issue
//!     end
//!     View->>Fn: typed arguments
//!     Fn-->>View: dataclass
//!     View->>Ser: serialize + re-validate
//!     alt Mismatch
//!         View-->>Api: ViewError::InvalidReturnValue
//!         Api-->>Client: 500
//!     end
//!     View-->>Client: configured status + JSON body
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use http::{Method, StatusCode};
//! use serde::{Deserialize, Serialize};
//! use speccify::{api_view, Api, ApiConfig, ApiRequest, Dataclass, Query};
//!
//! #[derive(Serialize, Deserialize, Dataclass)]
//! struct MyQueryData {
//!     name: String,
//! }
//!
//! #[derive(Serialize, Deserialize, Dataclass)]
//! struct MyResponse {
//!     length: usize,
//! }
//!
//! fn length(query: Query<MyQueryData>) -> anyhow::Result<MyResponse> {
//!     Ok(MyResponse { length: query.name.len() })
//! }
//!
//! let mut api = Api::new(ApiConfig::new("Demo", "1.0.0"));
//! api.route("/length", api_view([Method::GET]).handler(length).unwrap())
//!     .unwrap();
//!
//! let res = api.respond(ApiRequest::get("/length?name=hello"));
//! assert_eq!(res.status, StatusCode::OK);
//! assert_eq!(res.body.unwrap(), serde_json::json!({ "length": 5 }));
//!
//! let res = api.respond(ApiRequest::get("/length"));
//! assert_eq!(res.status, StatusCode::BAD_REQUEST);
//!
//! let doc = api.openapi();
//! assert!(doc["components"]["schemas"]["MyResponse"].is_object());
//! ```

extern crate self as speccify;

pub mod config;
pub mod dataclass;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod router;
pub mod security;
pub mod serializer;
pub mod server;
pub mod spec;
pub mod typed;
pub mod validator;

pub use config::ApiConfig;
pub use dataclass::{Dataclass, DataclassInfo, Empty, FieldInfo, FieldOutput, FieldType, Schema};
pub use dispatcher::{api_view, ApiView, OperationMeta, ViewBuilder};
pub use error::{CollectionError, ViewError};
pub use router::Api;
pub use security::{AllowAny, ApiKeyPermission, DenyAll, Permission};
pub use server::{ApiRequest, ApiResponse, RequestBody};
pub use speccify_macros::Dataclass;
pub use typed::{Data, FromApiRequest, Path, Query};
pub use validator::{FieldErrors, ValidationIssue};
