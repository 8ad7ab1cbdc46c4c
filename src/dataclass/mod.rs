//! # Dataclass Module
//!
//! A dataclass is a plain data-holding struct with named, typed fields. Views take
//! dataclasses as their query/body/path parameters and return one as their
//! response; everything the crate knows about a parameter comes from the
//! metadata recorded here.
//!
//! ## Declaring a dataclass
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use speccify::Dataclass;
//!
//! /// A pet in the store
//! #[derive(Debug, Serialize, Deserialize, Dataclass)]
//! struct Pet {
//!     name: String,
//!     /// Age in whole years
//!     age: Option<i64>,
//!     #[serde(default)]
//!     tags: Vec<String>,
//! }
//!
//! let info = <Pet as speccify::Dataclass>::dataclass_info();
//! assert_eq!(info.name, "Pet");
//! assert!(info.field("name").is_some_and(|f| f.is_required()));
//! assert!(info.field("age").is_some_and(|f| !f.is_required()));
//! ```
//!
//! ## Required fields
//!
//! A field is required unless it is an `Option<_>` or carries `#[serde(default)]`
//! (on the field or on the struct). This mirrors how `serde` itself treats missing
//! keys, so validation and deserialization agree.

mod core;

pub use core::*;
