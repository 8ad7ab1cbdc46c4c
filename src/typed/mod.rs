//! # Typed Module
//!
//! Classification wrappers and the handler trait that turns plain functions into
//! views.
//!
//! ## Overview
//!
//! A view is an ordinary function. Each argument says where its data comes from
//! by its type:
//!
//! - [`Query<T>`] - the query string, coerced per field type
//! - [`Data<T>`] - the request body, JSON or `application/x-www-form-urlencoded`
//! - [`Path<T>`] - the `{captures}` of the route pattern
//! - [`crate::ApiRequest`] - the raw request
//!
//! `T` must be a dataclass. The return type is `anyhow::Result<R>` where `R` is a
//! dataclass too ([`crate::Empty`] for no content).
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use speccify::{Dataclass, Query};
//!
//! #[derive(Serialize, Deserialize, Dataclass)]
//! struct Lookup {
//!     name: String,
//! }
//!
//! #[derive(Serialize, Deserialize, Dataclass)]
//! struct Length {
//!     length: usize,
//! }
//!
//! fn length(query: Query<Lookup>) -> anyhow::Result<Length> {
//!     Ok(Length { length: query.name.len() })
//! }
//! # let _ = length;
//! ```
//!
//! Arguments are all extracted before the function runs, and their problems
//! are reported together.

mod core;

pub use core::*;
