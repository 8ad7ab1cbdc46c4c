//! Request context and response envelope exchanged with views.
//!
//! The crate does not own a socket. [`ApiRequest`] is built from an
//! `http::Request` (or by hand in tests) and [`ApiResponse`] converts back into an
//! `http::Response`, so any HTTP server can drive an [`crate::Api`].

pub mod request;
pub mod response;

pub use request::{parse_query_params, ApiRequest, HeaderVec, ParamVec, RequestBody};
pub use response::ApiResponse;
