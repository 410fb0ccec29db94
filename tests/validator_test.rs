use futures::future::join_all;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use swagval::{ErrorKind, PathSegment, Schema, SerdeSchema, Validator};

fn person_validator() -> Result<Validator, failure::Error> {
    let definitions: HashMap<String, SerdeSchema> = serde_json::from_value(json!({
        "Person": {
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "children": {
                    "type": "array",
                    "items": { "$ref": "#/definitions/Person" }
                }
            }
        }
    }))?;
    Ok(Validator::new(definitions))
}

#[tokio::test]
async fn enum_scenario() -> Result<(), failure::Error> {
    let validator = Validator::default();
    let schema = Schema::from_value(json!({
        "type": "object",
        "properties": { "name": { "type": "string", "enum": ["a", "b"] } }
    }))?;

    let err = validator
        .validate(&schema, &json!({ "name": "c" }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidEnumValue);
    assert_eq!(err.path(), &[PathSegment::from("name")][..]);
    assert_eq!(err.reason(), "c is not in enum list.");

    Ok(())
}

#[tokio::test]
async fn validating_twice_gives_the_same_answer() -> Result<(), failure::Error> {
    let validator = person_validator()?;
    let serde_schema: SerdeSchema = serde_json::from_value(json!({
        "type": "array",
        "items": { "$ref": "#/definitions/Person" }
    }))?;
    let schema = Schema::from_serde(serde_schema.clone());

    let good = json!([{ "name": "amy", "children": [{ "name": "bo" }] }]);
    let bad = json!([{ "name": "amy", "children": [{ "nam": "bo" }] }]);

    assert!(validator.validate(&schema, &good).await.is_ok());
    assert!(validator.validate(&schema, &good).await.is_ok());

    let first = validator.validate(&schema, &bad).await.unwrap_err();
    let second = validator.validate(&schema, &bad).await.unwrap_err();
    assert_eq!(first, second);
    assert_eq!(first.kind(), ErrorKind::MissingRequiredField);
    assert_eq!(first.pointer().to_string(), "/0/children/0");

    // The items reference is resolved against the definitions on every
    // call; the compiled schema still holds the reference.
    match schema.form() {
        swagval::Form::Typed(typed) => match typed.items().map(Schema::form) {
            Some(swagval::Form::Ref(name)) => assert_eq!(name, "Person"),
            other => panic!("unexpected items: {:?}", other),
        },
        other => panic!("unexpected form: {:?}", other),
    }
    assert_eq!(
        serde_schema,
        serde_json::from_value(json!({
            "type": "array",
            "items": { "$ref": "#/definitions/Person" }
        }))?
    );

    Ok(())
}

#[tokio::test]
async fn concurrent_validations_share_a_schema() -> Result<(), failure::Error> {
    let validator = person_validator()?;
    let schema = Schema::from_value(json!({ "$ref": "#/definitions/Person" }))?;

    let instances = vec![
        json!({ "name": "a" }),
        json!({ "name": 1 }),
        json!({ "children": [] }),
        json!({ "name": "b", "children": [{ "name": "c" }, { "name": "d", "x": 1 }] }),
    ];

    let results = join_all(
        instances
            .iter()
            .map(|instance| validator.validate(&schema, instance)),
    )
    .await;

    let kinds: Vec<Option<ErrorKind>> = results
        .iter()
        .map(|result| result.as_ref().err().map(|err| err.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            None,
            Some(ErrorKind::InvalidType),
            Some(ErrorKind::MissingRequiredField),
            Some(ErrorKind::InvalidFieldExists),
        ]
    );

    let last = results[3].as_ref().unwrap_err();
    assert_eq!(last.pointer().to_string(), "/children/1");
    assert_eq!(last.reason(), "contains x not specified in schema.");

    Ok(())
}

#[test]
fn any_of_reports_every_alternative_in_order() -> Result<(), failure::Error> {
    let validator = Validator::default();
    let schema = Schema::from_value(json!({
        "anyOf": [
            { "type": "string" },
            { "type": "integer", "minimum": 10 },
            { "type": "array", "items": { "type": "string" } },
            { "type": "boolean" }
        ]
    }))?;

    let err = validator.check(&schema, &json!(3)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAnyOf);

    let causes: Vec<ErrorKind> = err
        .causes()
        .expect("anyOf failures carry causes")
        .iter()
        .map(|cause| cause.kind())
        .collect();
    assert_eq!(
        causes,
        vec![
            ErrorKind::InvalidType,
            ErrorKind::InvalidMinLength,
            ErrorKind::InvalidType,
            ErrorKind::InvalidType,
        ]
    );

    Ok(())
}

#[test]
fn leaf_errors_carry_no_causes() -> Result<(), failure::Error> {
    let validator = Validator::default();
    let schema = Schema::from_value(json!({
        "type": "object",
        "properties": { "age": { "type": "integer", "minimum": 1, "maximum": 100 } }
    }))?;

    let err = validator.check(&schema, &json!({ "age": 101 })).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidMaxLength);
    assert_eq!(err.path(), &[PathSegment::from("age")][..]);
    assert_eq!(
        err.reason(),
        "The field needs to be equal to or smaller than 100"
    );
    assert!(err.causes().is_none());

    Ok(())
}
