//! Schema representations.
//!
//! This module provides both an abstract ([`Schema`](struct.Schema.html)) and a
//! serializable/deserializable ([`SerdeSchema`](struct.SerdeSchema.html))
//! representation of Swagger 2.0 schemas.
//!
//! Converting a `SerdeSchema` into a `Schema` is a one-time compile pass:
//! type names are parsed, patterns are compiled, references are reduced to
//! their definition name and the keyword precedence is settled. Validation
//! never mutates a `Schema`, so the same compiled schema may be shared by any
//! number of concurrent validations.

use crate::errors::ErrorKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// An abstract, compiled representation of a schema node.
///
/// This struct is meant for use by validators. For serialization and
/// deserialization of schemas, instead use
/// [`SerdeSchema`](struct.SerdeSchema.html).
#[derive(Debug, Clone)]
pub struct Schema {
    form: Box<Form>,
    extra: HashMap<String, Value>,
}

impl Schema {
    /// Compile a SerdeSchema.
    ///
    /// This never fails. A malformed node compiles into
    /// [`Form::Malformed`](enum.Form.html#variant.Malformed), which reports
    /// its error when validation reaches it.
    pub fn from_serde(serde_schema: SerdeSchema) -> Schema {
        let SerdeSchema {
            rxf,
            typ,
            props,
            required,
            items,
            enm,
            minimum,
            maximum,
            min_items,
            max_items,
            pattern,
            multiple_of,
            any_of,
            all_of,
            one_of,
            extra,
        } = serde_schema;

        let form = if let Some(alternatives) = any_of {
            Form::AnyOf(compile_all(alternatives))
        } else if let Some(alternatives) = all_of {
            Form::AllOf(compile_all(alternatives))
        } else if let Some(alternatives) = one_of {
            Form::OneOf(compile_all(alternatives))
        } else if let Some(typ) = typ {
            let types: Result<Vec<Type>, UnknownType> =
                typ.names().iter().map(|name| name.parse()).collect();

            match types {
                Err(UnknownType(name)) => Form::Malformed {
                    kind: ErrorKind::UnknownReason,
                    reason: format!("Wrong swagger schema, trying to use unknown type {}", name),
                },
                Ok(types) => Form::Typed(Typed {
                    types,
                    multiple_of,
                    minimum,
                    maximum,
                    pattern: pattern.map(|source| Regex::new(&source).map_err(|_| source)),
                    enumeration: enm.map(Enumeration::from_values),
                    items: items.map(|items| Schema::from_serde(*items)),
                    min_items,
                    max_items,
                    required: required.unwrap_or_default(),
                    properties: props.map(|props| {
                        props
                            .into_iter()
                            .map(|(name, schema)| (name, Schema::from_serde(schema)))
                            .collect()
                    }),
                }),
            }
        } else if let Some(reference) = rxf {
            Form::Ref(definition_name(&reference).to_owned())
        } else {
            Form::Malformed {
                kind: ErrorKind::IncorrectSchema,
                reason: "Schema malformed.".to_owned(),
            }
        };

        Schema {
            form: Box::new(form),
            extra,
        }
    }

    /// Deserialize and compile a schema from a JSON value.
    pub fn from_value(value: Value) -> Result<Schema, serde_json::Error> {
        Ok(Schema::from_serde(serde_json::from_value(value)?))
    }

    /// Get the form of the schema.
    pub fn form(&self) -> &Form {
        &self.form
    }

    /// Same as [`form`](#method.form), but moves ownership.
    pub fn into_form(self) -> Form {
        *self.form
    }

    /// Get the extra data on the schema.
    ///
    /// Extra data here refers to key-value pairs which were present on the
    /// schema but are not keywords this crate validates, such as `format` or
    /// `description`.
    pub fn extra(&self) -> &HashMap<String, Value> {
        &self.extra
    }
}

fn compile_all(schemas: Vec<SerdeSchema>) -> Vec<Schema> {
    schemas.into_iter().map(Schema::from_serde).collect()
}

/// The trailing segment of a reference such as `#/definitions/Person`.
fn definition_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// The various forms which a schema may take on, and their respective data.
///
/// The variants are listed in the order of precedence used when a schema
/// carries several of the corresponding keywords.
#[derive(Debug, Clone)]
pub enum Form {
    /// Satisfied when at least one alternative is satisfied.
    AnyOf(Vec<Schema>),

    /// Satisfied when every alternative is satisfied.
    AllOf(Vec<Schema>),

    /// Satisfied when exactly one alternative is satisfied.
    OneOf(Vec<Schema>),

    /// The node carries a `type` and the constraints that go with it.
    Typed(Typed),

    /// The node refers to a definition by name and does whatever that
    /// definition does.
    Ref(String),

    /// The node cannot be validated against. Validation reaching it fails with
    /// the given kind and reason.
    Malformed { kind: ErrorKind, reason: String },
}

/// The constraints of a node carrying a `type`.
#[derive(Debug, Clone)]
pub struct Typed {
    pub(crate) types: Vec<Type>,
    pub(crate) multiple_of: Option<f64>,
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
    // The source text is kept when it does not compile.
    pub(crate) pattern: Option<Result<Regex, String>>,
    pub(crate) enumeration: Option<Enumeration>,
    pub(crate) items: Option<Schema>,
    pub(crate) min_items: Option<u64>,
    pub(crate) max_items: Option<u64>,
    pub(crate) required: Vec<String>,
    pub(crate) properties: Option<HashMap<String, Schema>>,
}

impl Typed {
    /// The accepted types. Data matches if it matches any of them.
    pub fn types(&self) -> &[Type] {
        &self.types
    }

    pub fn accepts(&self, typ: Type) -> bool {
        self.types.contains(&typ)
    }

    pub fn properties(&self) -> Option<&HashMap<String, Schema>> {
        self.properties.as_ref()
    }

    pub fn items(&self) -> Option<&Schema> {
        self.items.as_ref()
    }
}

/// The contents of an `enum` keyword.
#[derive(Debug, Clone)]
pub enum Enumeration {
    /// Plain literal values.
    Values(Vec<Value>),

    /// Object-shaped entries, treated as schema alternatives of which one
    /// must be satisfied.
    Schemas(Vec<Schema>),
}

impl Enumeration {
    fn from_values(values: Vec<Value>) -> Enumeration {
        if values.first().map_or(false, Value::is_object) {
            Enumeration::Schemas(
                values
                    .into_iter()
                    .map(|value| {
                        Schema::from_value(value).unwrap_or_else(|err| Schema {
                            form: Box::new(Form::Malformed {
                                kind: ErrorKind::IncorrectSchema,
                                reason: format!("Enum entry is not a schema: {}", err),
                            }),
                            extra: HashMap::new(),
                        })
                    })
                    .collect(),
            )
        } else {
            Enumeration::Values(values)
        }
    }
}

/// The type names a schema may use.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Type {
    String,
    Boolean,
    Integer,
    Number,
    Object,
    Array,
}

impl Type {
    pub fn as_str(self) -> &'static str {
        match self {
            Type::String => "string",
            Type::Boolean => "boolean",
            Type::Integer => "integer",
            Type::Number => "number",
            Type::Object => "object",
            Type::Array => "array",
        }
    }

    /// Does the instance belong to this type?
    ///
    /// `integer` and `number` both accept any JSON number.
    pub fn matches(self, instance: &Value) -> bool {
        match self {
            Type::String => instance.is_string(),
            Type::Boolean => instance.is_boolean(),
            Type::Integer | Type::Number => instance.is_number(),
            Type::Object => instance.is_object(),
            Type::Array => instance.is_array(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnknownType(pub String);

impl FromStr for Type {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(Type::String),
            "boolean" => Ok(Type::Boolean),
            "integer" => Ok(Type::Integer),
            "number" => Ok(Type::Number),
            "object" => Ok(Type::Object),
            "array" => Ok(Type::Array),
            _ => Err(UnknownType(s.to_owned())),
        }
    }
}

/// The `type` keyword: either one type name or a list of alternatives.
#[derive(Debug, PartialEq, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum SerdeType {
    Single(String),
    Many(Vec<String>),
}

impl SerdeType {
    pub fn names(&self) -> &[String] {
        match self {
            SerdeType::Single(name) => std::slice::from_ref(name),
            SerdeType::Many(names) => names,
        }
    }
}

/// A serialization/deserialization-friendly representation of a schema.
///
/// This struct is meant for use with the `serde` crate. It is excellent for
/// parsing from various data formats, but does not enforce any of the rules
/// about how schemas must be formed. For that, convert it into a
/// [`Schema`](struct.Schema.html).
#[derive(Debug, PartialEq, Deserialize, Serialize, Default, Clone)]
pub struct SerdeSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub rxf: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub typ: Option<SerdeType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "properties")]
    pub props: Option<HashMap<String, SerdeSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SerdeSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "enum")]
    pub enm: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "minItems")]
    pub min_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "maxItems")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "multipleOf")]
    pub multiple_of: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "anyOf")]
    pub any_of: Option<Vec<SerdeSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "allOf")]
    pub all_of: Option<Vec<SerdeSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "oneOf")]
    pub one_of: Option<Vec<SerdeSchema>>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
