//! JSON test file loading: schema conformance, then per-test deserialization.
//!
//! Every problem found is collected so a malformed file is reported in one go.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use engine::CaseConfig;
use jsonschema::Draft;
use serde::Deserialize;
use serde_json::{Map, Value};

const SCHEMA: &str = include_str!("../schemas/test_file.schema.json");

/// A loaded, validated test file.
#[derive(Debug, Clone, PartialEq)]
pub struct TestFile {
    pub tests: Vec<TestSpec>,
}

/// One entry of the `tests` array.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestSpec {
    pub function: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwdargs: Map<String, Value>,
    pub config: CaseConfig,
}

/// Read and validate a test file from disk.
pub fn load_test_file(path: &Path) -> Result<TestFile> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read test file {}", path.display()))?;
    parse_test_file(&contents).with_context(|| format!("load test file {}", path.display()))
}

/// Parse and validate test file contents.
pub fn parse_test_file(contents: &str) -> Result<TestFile> {
    let value: Value = serde_json::from_str(contents).context("parse json")?;
    validate_schema(&value)?;

    let entries = value
        .get("tests")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("missing \"tests\" array"))?;
    let mut tests = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        match serde_json::from_value::<TestSpec>(entry.clone()) {
            Ok(spec) => tests.push(spec),
            Err(err) => errors.push(format!("test {}: {err}", index + 1)),
        }
    }
    if !errors.is_empty() {
        bail!("invalid tests:\n- {}", errors.join("\n- "));
    }
    Ok(TestFile { tests })
}

fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(SCHEMA).context("parse test file schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile test file schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}
