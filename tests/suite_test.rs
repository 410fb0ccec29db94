use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use swagval::{Schema, SerdeSchema, Validator};

#[derive(Deserialize)]
struct TestSuite {
    name: String,
    definitions: HashMap<String, SerdeSchema>,
    schema: SerdeSchema,
    instances: Vec<TestCase>,
}

#[derive(Deserialize)]
struct TestCase {
    instance: Value,
    error: Option<Value>,
}

#[test]
fn suites() -> Result<(), failure::Error> {
    let mut entries = fs::read_dir("tests/suites")?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    assert!(!entries.is_empty());

    for path in entries {
        println!("{:?}", &path);
        let file = fs::read(&path)?;
        let suites: Vec<TestSuite> = serde_json::from_slice(&file)?;

        for suite in suites {
            let validator = Validator::new(suite.definitions);
            let schema = Schema::from_serde(suite.schema);

            for (i, test_case) in suite.instances.into_iter().enumerate() {
                println!("{}/{}", suite.name, i);
                let actual = match validator.check(&schema, &test_case.instance) {
                    Ok(()) => None,
                    Err(err) => Some(serde_json::to_value(&err)?),
                };

                assert_eq!(test_case.error, actual, "{} #{}", suite.name, i);
            }
        }
    }

    Ok(())
}
