//! # Serializer Module
//!
//! Converts between raw request data and dataclass instances, and back from
//! dataclasses to JSON.
//!
//! [`validate`] walks the target's [`crate::DataclassInfo`] and records *every*
//! problem before giving up, so a client sending three bad fields gets three
//! messages. Only when the walk is clean is `serde` asked to build the value.
//!
//! String-only sources (query strings, path captures, form bodies) go through
//! [`coerce_params`] first, which turns `"42"` into `42` for integer fields,
//! `"true"` into `true` for booleans and repeated keys into arrays for list
//! fields.
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use speccify::serializer::{validate, Location};
//! use speccify::Dataclass;
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize, Dataclass)]
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! let person: Person = validate(&json!({ "name": "Ada", "age": 36 }), Location::Body).unwrap();
//! assert_eq!(person.age, 36);
//!
//! let errors = validate::<Person>(&json!({ "age": "old" }), Location::Body).unwrap_err();
//! assert!(errors.has_field("name"));
//! assert!(errors.has_field("age"));
//! ```

mod core;

pub use core::*;
