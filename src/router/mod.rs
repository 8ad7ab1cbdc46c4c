//! # Router Module
//!
//! [`Api`] mounts views on URL patterns and routes requests to them.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling `{name}` patterns such as `/pets/{pet_id}` into anchored regexes
//! - Checking at mount time that the captures match the `Path<T>` fields
//! - Matching incoming requests and injecting the captured path parameters
//! - Turning server faults into `500` responses in [`Api::respond`]
//!
//! Routes are tried in mount order; the first pattern that matches the whole
//! path wins. Raw routes ([`Api::raw_route`]) are routed like views but are not
//! part of the generated OpenAPI document.
//!
//! ## Example
//!
//! ```rust
//! use http::{Method, StatusCode};
//! use serde::{Deserialize, Serialize};
//! use speccify::{api_view, Api, ApiConfig, ApiRequest, Dataclass, Path};
//!
//! #[derive(Serialize, Deserialize, Dataclass)]
//! struct PetId {
//!     pet_id: u64,
//! }
//!
//! #[derive(Serialize, Deserialize, Dataclass)]
//! struct Pet {
//!     id: u64,
//!     name: String,
//! }
//!
//! let mut api = Api::new(ApiConfig::new("Pets", "1.0.0"));
//! api.route(
//!     "/pets/{pet_id}",
//!     api_view([Method::GET])
//!         .handler(|p: Path<PetId>| -> anyhow::Result<Pet> {
//!             Ok(Pet { id: p.pet_id, name: "Rex".into() })
//!         })
//!         .unwrap(),
//! )
//! .unwrap();
//!
//! let res = api.respond(ApiRequest::get("/pets/42"));
//! assert_eq!(res.status, StatusCode::OK);
//! assert_eq!(res.body.unwrap()["id"], 42);
//! ```

mod core;

pub use core::*;
