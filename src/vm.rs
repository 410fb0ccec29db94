use crate::errors::{ErrorKind, PathSegment, ValidationError};
use crate::schema::{Enumeration, Form, Schema, Type, Typed};
use serde_json::Value;
use std::collections::HashMap;
use std::mem;
use tracing::trace;

type EvalResult = Result<(), ValidationError>;

pub fn validate(
    max_depth: usize,
    strict_instance_semantics: bool,
    definitions: &HashMap<String, Schema>,
    schema: &Schema,
    instance: &Value,
    path: Vec<PathSegment>,
) -> EvalResult {
    let mut vm = Vm {
        max_depth,
        strict_instance_semantics,
        definitions,
        instance_tokens: path,
        refs: vec![],
    };

    vm.eval(schema, instance)
}

/// Checks only the `type` keyword of a schema.
///
/// Nodes without a type (combinators, references, nodes missing both) pass.
pub fn validate_type(schema: &Schema, instance: &Value, path: Vec<PathSegment>) -> EvalResult {
    match schema.form() {
        Form::Typed(typed) => check_type(typed, instance, &path),
        Form::Malformed {
            kind: ErrorKind::UnknownReason,
            reason,
        } => Err(ValidationError::new(ErrorKind::UnknownReason, reason.clone(), path)),
        _ => Ok(()),
    }
}

fn check_type(typed: &Typed, instance: &Value, path: &[PathSegment]) -> EvalResult {
    if typed.types.iter().any(|typ| typ.matches(instance)) {
        return Ok(());
    }

    let expected: Vec<&str> = typed.types.iter().map(|typ| typ.as_str()).collect();
    Err(ValidationError::new(
        ErrorKind::InvalidType,
        format!("Incorrect type. Type should be {}", expected.join(" or ")),
        path.to_vec(),
    ))
}

struct Vm<'a> {
    max_depth: usize,
    strict_instance_semantics: bool,
    definitions: &'a HashMap<String, Schema>,
    instance_tokens: Vec<PathSegment>,
    // Definitions entered since the last step into the instance. Entering one
    // of these again without consuming any data can never terminate.
    refs: Vec<&'a str>,
}

impl<'a> Vm<'a> {
    fn eval(&mut self, schema: &'a Schema, instance: &'a Value) -> EvalResult {
        match schema.form() {
            Form::AnyOf(alternatives) => self.eval_any_of(alternatives, instance),
            Form::AllOf(alternatives) => {
                let causes: Vec<_> = alternatives
                    .iter()
                    .filter_map(|alternative| self.eval(alternative, instance).err())
                    .collect();

                if causes.is_empty() {
                    Ok(())
                } else {
                    Err(self
                        .err(
                            ErrorKind::InvalidAllOf,
                            "Tried object all of multiple objects but at least one didn't match.",
                        )
                        .with_causes(causes))
                }
            }
            Form::OneOf(alternatives) => {
                let mut matched = 0;
                let mut causes = vec![];
                for alternative in alternatives {
                    match self.eval(alternative, instance) {
                        Ok(()) => matched += 1,
                        Err(err) => causes.push(err),
                    }
                }

                match matched {
                    1 => Ok(()),
                    0 => Err(self
                        .err(
                            ErrorKind::InvalidOneOf,
                            "Tried object one of multiple objects but nothing matched.",
                        )
                        .with_causes(causes)),
                    _ => Err(self
                        .err(
                            ErrorKind::InvalidOneOf,
                            "Tried object one of multiple objects but many are matched.",
                        )
                        .with_causes(causes)),
                }
            }
            Form::Typed(typed) => self.eval_typed(typed, instance),
            Form::Ref(def) => self.eval_ref(def, instance),
            Form::Malformed { kind, reason } => Err(self.err(*kind, reason.clone())),
        }
    }

    fn eval_any_of(&mut self, alternatives: &'a [Schema], instance: &'a Value) -> EvalResult {
        let mut causes = vec![];
        for alternative in alternatives {
            match self.eval(alternative, instance) {
                Ok(()) => return Ok(()),
                Err(err) => causes.push(err),
            }
        }

        Err(self
            .err(
                ErrorKind::InvalidAnyOf,
                "Tried object any of multiple but nothing matched.",
            )
            .with_causes(causes))
    }

    fn eval_ref(&mut self, def: &'a str, instance: &'a Value) -> EvalResult {
        if self.refs.contains(&def) {
            return Err(self.err(
                ErrorKind::IncorrectSchema,
                format!("Circular reference to definition {}.", def),
            ));
        }

        if self.refs.len() == self.max_depth {
            return Err(self.err(
                ErrorKind::IncorrectSchema,
                format!("Maximum reference depth of {} exceeded.", self.max_depth),
            ));
        }

        let refd_schema = match self.definitions.get(def) {
            Some(schema) => schema,
            None => {
                trace!(definition = def, "no such definition");
                return Err(self.err(ErrorKind::IncorrectSchema, "Schema malformed."));
            }
        };

        // A definition must resolve to a typed node, possibly through more
        // references.
        match refd_schema.form() {
            Form::AnyOf(_) | Form::AllOf(_) | Form::OneOf(_) => {
                trace!(definition = def, "definition has no type");
                return Err(self.err(ErrorKind::IncorrectSchema, "Schema malformed."));
            }
            Form::Typed(_) | Form::Ref(_) | Form::Malformed { .. } => {}
        }

        trace!(definition = def, depth = self.refs.len(), "following reference");
        self.refs.push(def);
        let result = self.eval(refd_schema, instance);
        self.refs.pop();
        result
    }

    fn eval_typed(&mut self, typed: &'a Typed, instance: &'a Value) -> EvalResult {
        check_type(typed, instance, &self.instance_tokens)?;

        if let (Some(multiple_of), Some(n)) = (typed.multiple_of, instance.as_f64()) {
            // Only integer schemas; float remainders are not exact.
            if typed.accepts(Type::Integer) && n % multiple_of != 0.0 {
                return Err(self.err(
                    ErrorKind::InvalidMultipleOf,
                    format!("The field should be multiple of {}", multiple_of),
                ));
            }
        }

        if let Some(measure) = measure(instance) {
            if let Some(minimum) = typed.minimum {
                if minimum > measure {
                    return Err(self.err(
                        ErrorKind::InvalidMinLength,
                        format!("The field needs to be equal to or bigger than {}", minimum),
                    ));
                }
            }

            if let Some(maximum) = typed.maximum {
                if maximum < measure {
                    return Err(self.err(
                        ErrorKind::InvalidMaxLength,
                        format!("The field needs to be equal to or smaller than {}", maximum),
                    ));
                }
            }
        }

        if let (Some(pattern), Some(s)) = (&typed.pattern, instance.as_str()) {
            if typed.accepts(Type::String) {
                match pattern {
                    Ok(regex) if !regex.is_match(s) => {
                        return Err(self.err(
                            ErrorKind::InvalidStringPattern,
                            format!("The field needs to have a {} pattern.", regex.as_str()),
                        ));
                    }
                    Ok(_) => {}
                    Err(source) => {
                        return Err(self.err(
                            ErrorKind::IncorrectSchema,
                            format!("Invalid pattern {}.", source),
                        ));
                    }
                }
            }
        }

        match &typed.enumeration {
            Some(Enumeration::Schemas(alternatives)) => self.eval_any_of(alternatives, instance)?,
            Some(Enumeration::Values(values)) => {
                if !values.iter().any(|value| same_value(value, instance)) {
                    return Err(self.err(
                        ErrorKind::InvalidEnumValue,
                        format!("{} is not in enum list.", display_value(instance)),
                    ));
                }
            }
            None => {}
        }

        match instance {
            Value::Array(elements) if typed.accepts(Type::Array) => {
                self.eval_elements(typed, elements)
            }
            Value::Object(obj) if typed.accepts(Type::Object) => {
                for property in &typed.required {
                    if !obj.contains_key(property) {
                        return Err(self.err(
                            ErrorKind::MissingRequiredField,
                            format!("Expect {} to exist.", property),
                        ));
                    }
                }

                if let Some(properties) = &typed.properties {
                    for (key, sub_instance) in obj {
                        match properties.get(key) {
                            Some(sub_schema) => {
                                self.descend(key.as_str().into(), sub_schema, sub_instance)?
                            }
                            None if self.strict_instance_semantics => {
                                return Err(self.err(
                                    ErrorKind::InvalidFieldExists,
                                    format!("contains {} not specified in schema.", key),
                                ));
                            }
                            None => {}
                        }
                    }
                }

                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn eval_elements(&mut self, typed: &'a Typed, elements: &'a [Value]) -> EvalResult {
        let sub_schema = match &typed.items {
            Some(items) => items,
            None => return Err(self.err(ErrorKind::IncorrectSchema, "Array Schema malformed.")),
        };

        let len = elements.len() as u64;
        if let Some(min_items) = typed.min_items {
            if len < min_items {
                return Err(self.err(
                    ErrorKind::MinItemNummerNotMet,
                    format!("Array should be greater than {}", min_items),
                ));
            }
        }

        if let Some(max_items) = typed.max_items {
            if len > max_items {
                return Err(self.err(
                    ErrorKind::MaxItemNummerNotMet,
                    format!("Array should be less than {}", max_items),
                ));
            }
        }

        for (i, elem) in elements.iter().enumerate() {
            self.descend(PathSegment::Index(i), sub_schema, elem)?;
        }

        Ok(())
    }

    /// Evaluates a child of the current instance. The path and reference
    /// chain are restored whether or not the child is valid.
    fn descend(&mut self, token: PathSegment, schema: &'a Schema, instance: &'a Value) -> EvalResult {
        let refs = mem::take(&mut self.refs);
        self.instance_tokens.push(token);
        let result = self.eval(schema, instance);
        self.instance_tokens.pop();
        self.refs = refs;
        result
    }

    fn err<R: Into<String>>(&self, kind: ErrorKind, reason: R) -> ValidationError {
        ValidationError::new(kind, reason, self.instance_tokens.clone())
    }
}

/// The quantity `minimum` and `maximum` are compared against: the value of a
/// number, or the length of a string or an array.
fn measure(instance: &Value) -> Option<f64> {
    match instance {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(elements) => Some(elements.len() as f64),
        _ => None,
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => a == b,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(schema: Value, instance: Value) -> EvalResult {
        let schema = Schema::from_value(schema).expect("failed to parse schema");
        validate(32, true, &HashMap::new(), &schema, &instance, vec![])
    }

    #[test]
    fn measure_by_kind() {
        assert_eq!(measure(&json!(4.5)), Some(4.5));
        assert_eq!(measure(&json!("héllo")), Some(5.0));
        assert_eq!(measure(&json!([1, 2])), Some(2.0));
        assert_eq!(measure(&json!({})), None);
        assert_eq!(measure(&json!(true)), None);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(same_value(&json!(1), &json!(1.0)));
        assert!(!same_value(&json!(1), &json!("1")));
        assert!(same_value(&json!({"a": [1]}), &json!({"a": [1]})));
    }

    #[test]
    fn values_display_like_text() {
        assert_eq!(display_value(&json!("c")), "c");
        assert_eq!(display_value(&json!(34)), "34");
        assert_eq!(display_value(&json!(100.0)), "100");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!(null)), "null");
    }

    #[test]
    fn path_is_restored_between_siblings() {
        let err = run(
            json!({
                "type": "object",
                "properties": {
                    "a": { "type": "array", "items": { "type": "integer" } },
                    "b": { "type": "string" },
                },
            }),
            json!({ "a": [1, 2, 3], "b": 4 }),
        )
        .unwrap_err();

        assert_eq!(err.path(), &[PathSegment::from("b")][..]);
    }

    #[test]
    fn multiple_of_only_for_integers() {
        let err = run(json!({ "type": "integer", "multipleOf": 3 }), json!(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMultipleOf);
        assert_eq!(err.reason(), "The field should be multiple of 3");

        assert!(run(json!({ "type": "integer", "multipleOf": 3 }), json!(9)).is_ok());
        assert!(run(json!({ "type": "number", "multipleOf": 0.1 }), json!(0.3)).is_ok());
    }

    #[test]
    fn validate_type_ignores_everything_else() {
        let schema = Schema::from_value(json!({ "type": "string", "minimum": 10 })).unwrap();
        assert!(validate_type(&schema, &json!("a"), vec![]).is_ok());

        let err = validate_type(&schema, &json!(1), vec!["parameters".into()]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        assert_eq!(err.path(), &[PathSegment::from("parameters")][..]);

        let unknown = Schema::from_value(json!({ "name": "q", "type": "file" })).unwrap();
        let err = validate_type(&unknown, &json!("a"), vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownReason);

        let untyped = Schema::from_value(json!({ "name": "q" })).unwrap();
        assert!(validate_type(&untyped, &json!("a"), vec![]).is_ok());
    }

    #[test]
    fn invalid_pattern_keeps_the_type() {
        let schema = json!({ "type": "string", "pattern": "(?=x)" });

        let err = run(schema.clone(), json!(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        assert_eq!(err.reason(), "Incorrect type. Type should be string");

        let err = run(schema.clone(), json!("x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectSchema);
        assert_eq!(err.reason(), "Invalid pattern (?=x).");

        let schema = Schema::from_value(schema).unwrap();
        assert!(validate_type(&schema, &json!("x"), vec![]).is_ok());
        assert_eq!(
            validate_type(&schema, &json!(1), vec![]).unwrap_err().kind(),
            ErrorKind::InvalidType
        );
    }

    #[test]
    fn invalid_pattern_ignored_on_other_types() {
        let schema = json!({ "type": ["string", "integer"], "pattern": "([a-z" });
        assert!(run(schema.clone(), json!(4)).is_ok());
        assert_eq!(run(schema, json!("a")).unwrap_err().kind(), ErrorKind::IncorrectSchema);
    }
}
