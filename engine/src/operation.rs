//! Operations under test, their arguments, and named collections of them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::io::console::Console;

/// Signature of an operation: console handle plus call arguments.
pub type OperationFn = dyn Fn(&Console, &Args) -> Result<Value> + Send + Sync;

/// A named, shareable callable.
#[derive(Clone)]
pub struct Operation {
    name: String,
    func: Arc<OperationFn>,
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Operation {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Console, &Args) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, console: &Console, args: &Args) -> Result<Value> {
        (self.func)(console, args)
    }
}

/// Positional and keyword arguments passed to an operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Args {
    #[serde(default)]
    pub positional: Vec<Value>,
    #[serde(default)]
    pub keyword: Map<String, Value>,
}

impl Args {
    pub fn new(positional: Vec<Value>, keyword: Map<String, Value>) -> Self {
        Self {
            positional,
            keyword,
        }
    }

    pub fn positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keyword: Map::new(),
        }
    }

    /// Argument bound by position first, then by keyword.
    pub fn param(&self, index: usize, name: &str) -> Option<&Value> {
        self.positional
            .get(index)
            .or_else(|| self.keyword.get(name))
    }

    /// String argument; `Ok(None)` when absent or `null`.
    pub fn str_param(&self, index: usize, name: &str) -> Result<Option<&str>> {
        match self.param(index, name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.as_str())),
            Some(other) => Err(anyhow!("argument {name} must be a string, got {other}")),
        }
    }
}

/// Named collection of operations, i.e. the program under test.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    name: String,
    operations: BTreeMap<String, Operation>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: BTreeMap::new(),
        }
    }

    /// Builder-style registration.
    pub fn with<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&Console, &Args) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(Operation::new(name, func));
        self
    }

    pub fn register(&mut self, operation: Operation) {
        self.operations
            .insert(operation.name().to_string(), operation);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_bind_by_position_then_keyword() {
        let mut keyword = Map::new();
        keyword.insert("label".to_string(), json!("kw"));
        let args = Args::new(vec![json!("pos")], keyword.clone());
        assert_eq!(args.str_param(0, "label").expect("str"), Some("pos"));

        let args = Args::new(Vec::new(), keyword);
        assert_eq!(args.str_param(0, "label").expect("str"), Some("kw"));
        assert_eq!(args.str_param(1, "missing").expect("str"), None);
    }

    #[test]
    fn non_string_param_is_rejected() {
        let args = Args::positional([json!(3)]);
        let err = args.str_param(0, "label").expect_err("not a string");
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn namespace_lookup_by_name() {
        let namespace = Namespace::new("demo")
            .with("one", |_, _| Ok(json!(1)))
            .with("two", |_, _| Ok(json!(2)));
        let console = Console::scripted(Vec::<String>::new());
        let op = namespace.get("two").expect("registered");
        assert_eq!(op.call(&console, &Args::default()).expect("call"), json!(2));
        assert!(namespace.get("three").is_none());
        assert_eq!(namespace.names().collect::<Vec<_>>(), vec!["one", "two"]);
    }
}
