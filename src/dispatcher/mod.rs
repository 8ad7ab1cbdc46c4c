//! # Dispatcher Module
//!
//! Declares views and runs them.
//!
//! ## Registration
//!
//! [`api_view`] starts a declaration for a list of HTTP methods; the builder
//! collects permissions, the success status and documentation, and
//! [`ViewBuilder::handler`] attaches the function. Everything that can be wrong
//! with a declaration is found right there and reported as a
//! [`crate::CollectionError`]:
//!
//! - a method listed twice, or no method at all
//! - an argument whose extractor does not say where its data comes from
//! - two `Query` (or `Data`, or `Path`) arguments on one function
//! - a wrapped type or response type that is not a dataclass
//! - two different dataclasses sharing a component name
//!
//! [`ApiView::add`] stacks another function on the same view for more methods.
//!
//! ## Request Flow
//!
//! [`ApiView::call`] runs the steps in a fixed order:
//!
//! 1. Unknown method → `405` with an `Allow` header
//! 2. First refusing permission → `403`
//! 3. All arguments extracted; any problem → `400` listing all of them
//! 4. The function runs; its error is returned as [`crate::ViewError::Handler`]
//! 5. The result is serialized and checked against the declared dataclass
//! 6. The configured status is sent, without a body for `204`

mod core;

pub use core::*;
