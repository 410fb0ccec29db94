//! The error type for every validation failure.
//!
//! There is exactly one error shape in this crate: a
//! [`ValidationError`](struct.ValidationError.html) carrying an
//! [`ErrorKind`](enum.ErrorKind.html), a human-readable reason, the path into
//! the instance where validation failed, and, for combinators only, the
//! failures of every rejected alternative.

use failure::Fail;
use json_pointer::JsonPointer;
use serde::Serialize;
use std::fmt;

/// The closed set of failure kinds.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// An object carries a property its schema does not declare.
    InvalidFieldExists,
    MissingRequiredField,
    InvalidEnumValue,
    InvalidType,
    InvalidStringPattern,
    /// The value (or its length) is below `minimum`.
    InvalidMinLength,
    /// The value (or its length) is above `maximum`.
    InvalidMaxLength,
    InvalidMultipleOf,
    InvalidAnyOf,
    InvalidAllOf,
    InvalidOneOf,
    MinItemNummerNotMet,
    MaxItemNummerNotMet,
    /// The schema itself is malformed.
    IncorrectSchema,
    /// The schema uses a type name outside of the supported set.
    UnknownReason,

    /// A path parameter failed validation. Only produced by
    /// [`RequestValidator`](../router/struct.RequestValidator.html).
    InvalidPathType,
    /// A query parameter failed validation. Only produced by
    /// [`RequestValidator`](../router/struct.RequestValidator.html).
    InvalidParams,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidFieldExists => "INVALID_FIELD_EXISTS",
            ErrorKind::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorKind::InvalidEnumValue => "INVALID_ENUM_VALUE",
            ErrorKind::InvalidType => "INVALID_TYPE",
            ErrorKind::InvalidStringPattern => "INVALID_STRING_PATTERN",
            ErrorKind::InvalidMinLength => "INVALID_MIN_LENGTH",
            ErrorKind::InvalidMaxLength => "INVALID_MAX_LENGTH",
            ErrorKind::InvalidMultipleOf => "INVALID_MULTIPLE_OF",
            ErrorKind::InvalidAnyOf => "INVALID_ANY_OF",
            ErrorKind::InvalidAllOf => "INVALID_ALL_OF",
            ErrorKind::InvalidOneOf => "INVALID_ONE_OF",
            ErrorKind::MinItemNummerNotMet => "MIN_ITEM_NUMMER_NOT_MET",
            ErrorKind::MaxItemNummerNotMet => "MAX_ITEM_NUMMER_NOT_MET",
            ErrorKind::IncorrectSchema => "INCORRECT_SCHEMA",
            ErrorKind::UnknownReason => "UNKNOWN_REASON",
            ErrorKind::InvalidPathType => "INVALID_PATH_TYPE",
            ErrorKind::InvalidParams => "INVALID_PARAMS",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step into an instance: a property name or an array index.
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Property(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PathSegment::Property(name) => f.write_str(name),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(name: &str) -> Self {
        PathSegment::Property(name.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(name: String) -> Self {
        PathSegment::Property(name)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single validation failure.
///
/// `causes` is only ever populated for `InvalidAnyOf`, `InvalidOneOf` and
/// `InvalidAllOf`, and holds one entry per failed alternative in the order the
/// alternatives were declared.
#[derive(Debug, Fail, PartialEq, Clone, Serialize)]
#[fail(display = "{}: {}", kind, reason)]
pub struct ValidationError {
    kind: ErrorKind,
    reason: String,
    path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    causes: Option<Vec<ValidationError>>,
}

impl ValidationError {
    pub fn new<R: Into<String>>(kind: ErrorKind, reason: R, path: Vec<PathSegment>) -> Self {
        ValidationError {
            kind,
            reason: reason.into(),
            path,
            causes: None,
        }
    }

    /// Attaches the failures of rejected combinator alternatives.
    pub fn with_causes(mut self, causes: Vec<ValidationError>) -> Self {
        self.causes = Some(causes);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Replaces the kind while keeping reason, path and causes.
    pub fn retag(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The location within the instance which was rejected.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn causes(&self) -> Option<&[ValidationError]> {
        self.causes.as_deref()
    }

    /// The path as a JSON Pointer, e.g. `/a/b/0/c`.
    pub fn pointer(&self) -> JsonPointer<String, Vec<String>> {
        JsonPointer::new(self.path.iter().map(ToString::to_string).collect())
    }
}
