//! Validate input data against schemas.
//!
//! This module contains logic related to *validation*, the process of taking a
//! piece of input data (called an "instance") and checking if it's valid
//! according to a schema.
//!
//! See the docs for [`Validator`](struct.Validator.html) for more.

use crate::errors::{PathSegment, ValidationError};
use crate::schema::{Schema, SerdeSchema, SerdeType};
use crate::vm;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Validates instances against schemas, resolving references against a
/// table of definitions.
#[derive(Debug, Default, Clone)]
pub struct Validator {
    definitions: HashMap<String, Schema>,
    config: Config,
}

impl Validator {
    /// Constructs a new validator using the default configuration.
    pub fn new(definitions: HashMap<String, SerdeSchema>) -> Self {
        Self::new_with_config(definitions, Config::default())
    }

    /// Constructs a new validator using a configuration.
    pub fn new_with_config(definitions: HashMap<String, SerdeSchema>, config: Config) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|(name, schema)| (name, Schema::from_serde(schema)))
                .collect(),
            config,
        }
    }

    pub fn definitions(&self) -> &HashMap<String, Schema> {
        &self.definitions
    }

    /// Validate an instance against a schema.
    ///
    /// The walk itself never suspends. This is an `async fn` so that callers
    /// can launch many validations and await them together.
    pub async fn validate(&self, schema: &Schema, instance: &Value) -> Result<(), ValidationError> {
        self.check(schema, instance)
    }

    /// Same as [`validate`](#method.validate), but synchronous.
    ///
    /// Returns the first violation found. Combinators report the failures of
    /// each of their rejected alternatives as causes.
    pub fn check(&self, schema: &Schema, instance: &Value) -> Result<(), ValidationError> {
        vm::validate(
            self.config.max_depth,
            self.config.strict_instance_semantics,
            &self.definitions,
            schema,
            instance,
            vec![],
        )
        .map_err(|err| {
            debug!(kind = %err.kind(), path = %err.pointer(), reason = err.reason(), "validation failed");
            err
        })
    }

    /// Check only the `type` of a schema, reporting failures under `path`.
    ///
    /// Accepts parameter descriptors such as `{"name": "id", "type":
    /// "integer"}` as well as full schema nodes. A schema without a `type`
    /// always passes.
    pub fn validate_type(
        &self,
        schema: &Schema,
        instance: &Value,
        path: &[PathSegment],
    ) -> Result<(), ValidationError> {
        vm::validate_type(schema, instance, path.to_vec())
    }

    /// Same as [`validate_type`](#method.validate_type), for a bare type
    /// name such as `"integer"`.
    pub fn validate_type_name(
        &self,
        type_name: &str,
        instance: &Value,
        path: &[PathSegment],
    ) -> Result<(), ValidationError> {
        let schema = Schema::from_serde(SerdeSchema {
            typ: Some(SerdeType::Single(type_name.to_owned())),
            ..SerdeSchema::default()
        });

        self.validate_type(&schema, instance, path)
    }
}

/// Configuration for how validation should proceed.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct Config {
    max_depth: usize,
    strict_instance_semantics: bool,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of references followed in a row without
    /// stepping into the instance. The default value is 32.
    ///
    /// Exceeding it fails validation with `IncorrectSchema`. The count starts
    /// over at every property or array element, so recursive definitions may
    /// validate data of any depth. Cycles between definitions that consume no
    /// data are detected regardless of this setting.
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets whether to use strict instance semantics. The default is to use
    /// strict instance semantics.
    ///
    /// With strict instance semantics, an object validated against a schema
    /// declaring `properties` may not carry any property the schema does not
    /// declare. Otherwise undeclared properties are ignored.
    pub fn strict_instance_semantics(&mut self, strict_instance_semantics: bool) -> &mut Self {
        self.strict_instance_semantics = strict_instance_semantics;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 32,
            strict_instance_semantics: true,
        }
    }
}
