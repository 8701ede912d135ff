//! Declared expectations for a test case.

use serde_json::Value;

/// Literal that marks an expectation as "not provided" in test definitions.
pub const UNDEFINED_LITERAL: &str = "undefined";
/// Escape prefix for expectation strings that would otherwise be reserved.
pub const LITERAL_PREFIX: &str = "r:";

/// Expected value for a stream or a return value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Expectation {
    /// Not checked.
    #[default]
    Unchecked,
    /// Exact text.
    Text(String),
    /// Exact structured value.
    Value(Value),
}

impl Expectation {
    /// Expectation for an output stream from a JSON value.
    ///
    /// Strings are taken verbatim; sequences are joined as lines, each line
    /// terminated by `\n`; `null` is unchecked.
    pub fn output_from_json(value: &Value) -> Self {
        match value {
            Value::Null => Expectation::Unchecked,
            Value::String(text) => Expectation::Text(text.clone()),
            Value::Array(lines) => {
                Expectation::Text(lines.iter().map(|line| format!("{}\n", plain(line))).collect())
            }
            other => Expectation::Text(plain(other)),
        }
    }

    /// Expectation for a return value from a JSON value.
    ///
    /// The literal `"undefined"` means "not provided"; a string starting with
    /// `r:` is unwrapped to its suffix so `"r:undefined"` expects the word
    /// itself.
    pub fn return_from_json(value: Value) -> Self {
        match value {
            Value::String(text) if text == UNDEFINED_LITERAL => Expectation::Unchecked,
            Value::String(text) => match text.strip_prefix(LITERAL_PREFIX) {
                Some(literal) => Expectation::Value(Value::String(literal.to_string())),
                None => Expectation::Value(Value::String(text)),
            },
            other => Expectation::Value(other),
        }
    }

    /// Whether a return value satisfies this expectation. A missing value
    /// only satisfies `Unchecked`.
    pub fn matches_value(&self, actual: Option<&Value>) -> bool {
        match self {
            Expectation::Unchecked => true,
            Expectation::Text(text) => matches!(actual, Some(Value::String(s)) if s == text),
            Expectation::Value(expected) => actual == Some(expected),
        }
    }

    /// Whether captured text satisfies this expectation.
    pub fn matches_text(&self, actual: &str) -> bool {
        match self.expected_text() {
            None => true,
            Some(expected) => expected == actual,
        }
    }

    /// Text form of the expectation, `None` when unchecked.
    pub fn expected_text(&self) -> Option<String> {
        match self {
            Expectation::Unchecked => None,
            Expectation::Text(text) => Some(text.clone()),
            Expectation::Value(value) => Some(plain(value)),
        }
    }

    /// Representation used in return value diffs.
    pub fn render(&self) -> String {
        match self {
            Expectation::Unchecked => "<unchecked>".to_string(),
            Expectation::Text(text) => render_value(&Value::String(text.clone())),
            Expectation::Value(value) => render_value(value),
        }
    }
}

/// Compact JSON representation of a value.
pub fn render_value(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

/// Strings without quotes, everything else as compact JSON.
pub fn plain(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => render_value(other),
    }
}
