//! `swagval` validates JSON data against schemas written in the subset of
//! JSON Schema used by [Swagger 2.0][swagger] documents, and validates
//! incoming requests against the operations such a document declares.
//!
//! # Validating data
//!
//! ```
//! use serde_json::json;
//! use swagval::{ErrorKind, PathSegment, Schema, SerdeSchema, Validator};
//! use failure::Error;
//! use std::collections::HashMap;
//!
//! fn main() -> Result<(), Error> {
//!     let definitions: HashMap<String, SerdeSchema> = serde_json::from_value(json!({
//!         "Child": {
//!             "type": "object",
//!             "required": ["name"],
//!             "properties": {
//!                 "name": { "type": "string" },
//!                 "age": { "type": "integer", "minimum": 0 }
//!             }
//!         }
//!     }))?;
//!
//!     // The Schema type is the compiled form of a SerdeSchema. Compiling
//!     // never fails; malformed parts of a schema are reported when
//!     // validation reaches them.
//!     let schema = Schema::from_value(json!({
//!         "type": "object",
//!         "properties": {
//!             "name": { "type": "string" },
//!             "children": {
//!                 "type": "array",
//!                 "items": { "$ref": "#/definitions/Child" }
//!             }
//!         }
//!     }))?;
//!
//!     let validator = Validator::new(definitions);
//!
//!     let input_ok = json!({
//!         "name": "John Doe",
//!         "children": [{ "name": "Amy", "age": 4 }]
//!     });
//!     assert!(validator.check(&schema, &input_ok).is_ok());
//!
//!     let input_bad = json!({
//!         "name": "John Doe",
//!         "children": [{ "name": "Amy", "age": -4 }]
//!     });
//!
//!     // Validation stops at the first violation, and reports where it is.
//!     let err = validator.check(&schema, &input_bad).unwrap_err();
//!     assert_eq!(err.kind(), ErrorKind::InvalidMinLength);
//!     assert_eq!(err.reason(), "The field needs to be equal to or bigger than 0");
//!     assert_eq!(
//!         err.path(),
//!         &[PathSegment::from("children"), PathSegment::from(0), PathSegment::from("age")][..]
//!     );
//!     assert_eq!(err.pointer().to_string(), "/children/0/age");
//!
//!     Ok(())
//! }
//! ```
//!
//! [`Validator::validate`](validator/struct.Validator.html#method.validate) is
//! the `async` flavor of `check`, for callers that run many validations and
//! await them together.
//!
//! # Validating requests
//!
//! [`RequestValidator`](router/struct.RequestValidator.html) matches a request
//! path against the templated paths of a document, then checks the query,
//! path and body parameters of the addressed operation.
//!
//! [swagger]: https://swagger.io/specification/v2/

mod vm;

pub mod errors;
pub mod router;
pub mod schema;
pub mod validator;

pub use crate::errors::{ErrorKind, PathSegment, ValidationError};
pub use crate::router::{Request, RequestValidator, SwaggerDocument};
pub use crate::schema::{Enumeration, Form, Schema, SerdeSchema, Type, Typed};
pub use crate::validator::{Config, Validator};
