//! Outcome comparison against declared expectations.

use crate::core::diff::compare_diff;
use crate::core::expect::{Expectation, render_value};
use crate::core::style::{RESET, YELLOW};
use crate::core::types::Execution;

/// Expectations a run is compared against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expectations {
    pub stdout: Expectation,
    pub stderr: Expectation,
    pub rval: Expectation,
}

/// Result of comparing one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub success: bool,
    pub diff: String,
}

/// Compare an execution against its expectations.
///
/// A run that raised or timed out is a failure without any diff sections; the
/// caller decides whether that failure was expected.
pub fn compare(execution: &Execution, expectations: &Expectations) -> Comparison {
    if execution.exception().is_some() {
        return Comparison {
            success: false,
            diff: String::new(),
        };
    }

    let mut success = true;
    let mut diff = String::new();
    let rval = execution.return_value();

    if !expectations.rval.matches_value(rval) {
        success = false;
        let received = rval.map_or_else(|| "<unchecked>".to_string(), render_value);
        diff.push_str(&format!(
            "\n{YELLOW}====> Return Value Diff <====\nReceived: {RESET}{received}\n{YELLOW}Expected: {RESET}{}",
            expectations.rval.render()
        ));
    }
    if let Some(section) = stream_section(
        "Standard Output",
        &execution.captured.stdout,
        &expectations.stdout,
    ) {
        success = false;
        diff.push_str(&section);
    }
    if let Some(section) = stream_section(
        "Error Output",
        &execution.captured.stderr,
        &expectations.stderr,
    ) {
        success = false;
        diff.push_str(&section);
    }

    Comparison { success, diff }
}

fn stream_section(label: &str, actual: &str, expectation: &Expectation) -> Option<String> {
    if expectation.matches_text(actual) {
        return None;
    }
    let expected = expectation.expected_text()?;
    Some(format!(
        "\n{YELLOW}====> {label} Diff <====\nExpected:{RESET}\n{}",
        compare_diff(actual, &expected)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Captured, Termination};
    use crate::error::ExceptionInfo;
    use serde_json::{Value, json};

    fn returned(value: Value, stdout: &str, stderr: &str) -> Execution {
        Execution {
            termination: Termination::Returned(value),
            captured: Captured {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            },
        }
    }

    #[test]
    fn unchecked_expectations_always_succeed() {
        let execution = returned(json!(42), "anything\n", "warn\n");
        let comparison = compare(&execution, &Expectations::default());
        assert!(comparison.success);
        assert!(comparison.diff.is_empty());
    }

    #[test]
    fn return_value_mismatch_adds_section() {
        let execution = returned(json!(["string", 1, true]), "", "");
        let expectations = Expectations {
            rval: Expectation::Value(json!(["string", 1, false])),
            ..Expectations::default()
        };
        let comparison = compare(&execution, &expectations);
        assert!(!comparison.success);
        assert!(comparison.diff.contains("Return Value Diff"));
        assert!(comparison.diff.contains(r#"["string",1,true]"#));
        assert!(comparison.diff.contains(r#"["string",1,false]"#));
    }

    #[test]
    fn return_value_match_succeeds() {
        let execution = returned(json!(["string", 1, true]), "", "");
        let expectations = Expectations {
            rval: Expectation::Value(json!(["string", 1, true])),
            ..Expectations::default()
        };
        assert!(compare(&execution, &expectations).success);
    }

    #[test]
    fn stream_mismatches_are_reported_separately() {
        let execution = returned(Value::Null, "A\nB\n", "oops\n");
        let expectations = Expectations {
            stdout: Expectation::Text("X\nB\n".to_string()),
            stderr: Expectation::Text("oops\n".to_string()),
            ..Expectations::default()
        };
        let comparison = compare(&execution, &expectations);
        assert!(!comparison.success);
        assert!(comparison.diff.contains("Standard Output Diff"));
        assert!(!comparison.diff.contains("Error Output Diff"));
    }

    #[test]
    fn missing_outcome_does_not_satisfy_null_return() {
        let execution = Execution {
            termination: Termination::NoOutcome,
            captured: Captured::default(),
        };
        let expectations = Expectations {
            rval: Expectation::Value(Value::Null),
            ..Expectations::default()
        };
        let comparison = compare(&execution, &expectations);
        assert!(!comparison.success);
        assert!(comparison.diff.contains("Received: \u{1b}[0m<unchecked>"));
        assert!(compare(&execution, &Expectations::default()).success);
    }

    #[test]
    fn raised_runs_fail_without_diff() {
        let execution = Execution {
            termination: Termination::Raised(ExceptionInfo::new("RuntimeError", "boom")),
            captured: Captured::default(),
        };
        let comparison = compare(&execution, &Expectations::default());
        assert!(!comparison.success);
        assert!(comparison.diff.is_empty());
    }
}
