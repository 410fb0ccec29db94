//! Validate incoming requests against a Swagger 2.0 document.
//!
//! This is framework agnostic: build a [`Request`](struct.Request.html) from
//! whatever the host framework hands over, and feed it to
//! [`RequestValidator::validate`](struct.RequestValidator.html#method.validate).

use crate::errors::{ErrorKind, PathSegment, ValidationError};
use crate::schema::{Schema, SerdeSchema, SerdeType};
use crate::validator::{Config, Validator};
use futures::future::try_join_all;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::trace;
use url::Url;

/// The parts of a Swagger 2.0 document used for request validation.
#[derive(Debug, PartialEq, Deserialize, Serialize, Default, Clone)]
pub struct SwaggerDocument {
    #[serde(default)]
    pub paths: HashMap<String, HashMap<String, SerdeOperation>>,

    #[serde(default)]
    pub definitions: HashMap<String, SerdeSchema>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize, Default, Clone)]
pub struct SerdeOperation {
    #[serde(default)]
    pub parameters: Vec<SerdeParameter>,
}

#[derive(Debug, PartialEq, Deserialize, Serialize, Clone)]
pub struct SerdeParameter {
    pub name: Option<String>,

    #[serde(rename = "in")]
    pub location: Location,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub typ: Option<SerdeType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SerdeSchema>,

    #[serde(skip_serializing_if = "HashMap::is_empty")]
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Where a parameter is carried.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize, Clone, Copy, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    Query,
    Path,
    Body,
    Header,
    FormData,
}

/// What the host framework knows about an incoming request.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Request {
    /// The request path, without the query string.
    pub path: String,
    pub method: String,
    /// Parsed query parameters.
    pub params: Map<String, Value>,
    pub body: Value,
}

impl Request {
    /// Builds a request from a method and a URL, parsing the query string.
    ///
    /// The URL may be relative (`/actions?q=1`). Query keys and values are
    /// form-decoded, and values which look like numbers become JSON numbers.
    /// The path is kept percent-encoded, as it appears on the wire.
    pub fn new(method: &str, url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(REQUEST_BASE)?.join(url)?;

        let params = url
            .query_pairs()
            .filter(|(key, value)| !key.is_empty() && !value.is_empty())
            .map(|(key, value)| (key.into_owned(), parse_scalar(&value)))
            .collect();

        Ok(Request {
            path: url.path().to_owned(),
            method: method.to_owned(),
            params,
            body: Value::Null,
        })
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

const REQUEST_BASE: &str = "http://localhost/";

fn decode_segment(segment: &str) -> Cow<str> {
    percent_decode_str(segment).decode_utf8_lossy()
}

fn parse_scalar(text: &str) -> Value {
    if let Ok(n) = text.parse::<i64>() {
        Value::from(n)
    } else if let Ok(n) = text.parse::<f64>() {
        if n.is_finite() {
            Value::from(n)
        } else {
            Value::String(text.to_owned())
        }
    } else {
        Value::String(text.to_owned())
    }
}

struct Parameter {
    name: Option<String>,
    location: Location,
    // Compiled from the parameter's own `type`, for query and path parameters.
    descriptor: Option<Schema>,
    schema: Option<Schema>,
}

impl Parameter {
    fn from_serde(parameter: SerdeParameter) -> Self {
        let descriptor = parameter.typ.map(|typ| {
            Schema::from_serde(SerdeSchema {
                typ: Some(typ),
                ..SerdeSchema::default()
            })
        });

        Parameter {
            name: parameter.name,
            location: parameter.location,
            descriptor,
            schema: parameter.schema.map(Schema::from_serde),
        }
    }
}

struct Route {
    template: String,
    segments: Vec<String>,
    operations: HashMap<String, Vec<Parameter>>,
}

impl Route {
    /// Does the request path fit this template? `{var}` segments match
    /// anything.
    fn matches(&self, path: &str) -> bool {
        let tokens: Vec<&str> = path.split('/').collect();
        tokens.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(tokens)
                .all(|(segment, token)| is_variable(segment) || *segment == decode_segment(token))
    }

    fn literal_segments(&self) -> usize {
        self.segments.iter().filter(|s| !is_variable(s)).count()
    }

    /// The value at the position of `{name}` in the request path.
    fn extract(&self, name: &str, path: &str) -> Option<Value> {
        let token = format!("{{{}}}", name);
        let idx = self.segments.iter().position(|segment| *segment == token)?;
        path.split('/')
            .nth(idx)
            .map(|segment| parse_scalar(&decode_segment(segment)))
    }
}

fn is_variable(segment: &str) -> bool {
    segment.starts_with('{') && segment.ends_with('}')
}

/// Validates requests against the operations declared by a Swagger document.
pub struct RequestValidator {
    validator: Validator,
    routes: Vec<Route>,
}

impl RequestValidator {
    pub fn new(document: SwaggerDocument) -> Self {
        Self::new_with_config(document, Config::default())
    }

    pub fn new_with_config(document: SwaggerDocument, config: Config) -> Self {
        let SwaggerDocument { paths, definitions } = document;

        let mut routes: Vec<Route> = paths
            .into_iter()
            .map(|(template, operations)| Route {
                segments: template.split('/').map(str::to_owned).collect(),
                template,
                operations: operations
                    .into_iter()
                    .map(|(method, operation)| {
                        (
                            method.to_lowercase(),
                            operation
                                .parameters
                                .into_iter()
                                .map(Parameter::from_serde)
                                .collect(),
                        )
                    })
                    .collect(),
            })
            .collect();

        // Most specific first, so `/actions/new` is preferred over
        // `/actions/{id}`.
        routes.sort_by(|a, b| {
            b.literal_segments()
                .cmp(&a.literal_segments())
                .then_with(|| a.template.cmp(&b.template))
        });

        RequestValidator {
            validator: Validator::new_with_config(definitions, config),
            routes,
        }
    }

    /// Parse a Swagger document from JSON text.
    pub fn from_json(json: &str) -> Result<Self, failure::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The path template matching a request path, if any.
    pub fn find_template(&self, path: &str) -> Option<&str> {
        self.find_route(path).map(|route| route.template.as_str())
    }

    fn find_route(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Validate every declared parameter of the operation the request
    /// addresses.
    ///
    /// Requests addressing no declared operation pass. All parameter
    /// validations run together; the first failure in declaration order is
    /// returned.
    pub async fn validate(&self, request: &Request) -> Result<(), ValidationError> {
        let route = match self.find_route(&request.path) {
            Some(route) => route,
            None => {
                trace!(path = %request.path, "no matching path template");
                return Ok(());
            }
        };

        let parameters = match route.operations.get(&request.method.to_lowercase()) {
            Some(parameters) if !parameters.is_empty() => parameters,
            _ => {
                trace!(template = %route.template, method = %request.method, "nothing to validate");
                return Ok(());
            }
        };

        trace!(template = %route.template, count = parameters.len(), "validating parameters");
        try_join_all(
            parameters
                .iter()
                .map(|parameter| self.validate_parameter(route, parameter, request)),
        )
        .await?;

        Ok(())
    }

    async fn validate_parameter(
        &self,
        route: &Route,
        parameter: &Parameter,
        request: &Request,
    ) -> Result<(), ValidationError> {
        match parameter.location {
            Location::Query => {
                if let (Some(name), Some(descriptor)) = (&parameter.name, &parameter.descriptor) {
                    match request.params.get(name) {
                        Some(value) if !value.is_null() => self
                            .validator
                            .validate_type(descriptor, value, &[PathSegment::from("parameters")])
                            .map_err(|err| err.retag(ErrorKind::InvalidParams)),
                        _ => Ok(()),
                    }
                } else {
                    Ok(())
                }
            }
            Location::Path => {
                if let (Some(name), Some(descriptor)) = (&parameter.name, &parameter.descriptor) {
                    let value = route.extract(name, &request.path).unwrap_or(Value::Null);
                    self.validator
                        .validate_type(descriptor, &value, &[PathSegment::from("paths")])
                        .map_err(|err| err.retag(ErrorKind::InvalidPathType))
                } else {
                    Ok(())
                }
            }
            Location::Body => match &parameter.schema {
                Some(schema) => self.validator.validate(schema, &request.body).await,
                None => Ok(()),
            },
            Location::Header | Location::FormData => Ok(()),
        }
    }
}
