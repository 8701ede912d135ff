//! Test cases: configuration, one supervised run, and the resulting outcome.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::core::budget::TimeBudget;
use crate::core::compare::{Expectations, compare};
use crate::core::expect::{Expectation, plain};
use crate::core::types::Execution;
use crate::error::ExceptionInfo;
use crate::io::config::EngineConfig;
use crate::io::console::{EchoFlags, RealConsole, StdConsole};
use crate::io::status::StatusPrinter;
use crate::io::supervisor::{DEFAULT_CANCEL_GRACE, ExecRequest, execute};
use crate::operation::{Args, Operation};

/// Configuration keys accepted by [`TestCase::configure`].
///
/// Every key is optional; absent keys leave the current setting unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseConfig {
    pub name: Option<String>,
    /// Seconds; zero or negative disables the budget.
    pub timeout: Option<f64>,
    pub user_input: Option<Value>,
    pub print_input: Option<bool>,
    pub capture_input: Option<bool>,
    pub print_out: Option<bool>,
    pub print_err: Option<bool>,
    pub expect_out: Option<Value>,
    pub expect_err: Option<Value>,
    /// Raw value; `"undefined"` means not provided, `r:` escapes a literal.
    /// A present `null` expects a null return.
    #[serde(default, deserialize_with = "present_value")]
    pub expect_rval: Option<Value>,
    pub expect_success: Option<bool>,
}

/// Fields produced by the most recent run. Reset before every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the run failed before returning.
    pub rval: Option<Value>,
    pub success: bool,
    pub diff: String,
    pub exception: Option<ExceptionInfo>,
}

/// One operation plus its arguments, scripted input, budget and expectations.
#[derive(Debug, Clone)]
pub struct TestCase {
    name: String,
    operation: Operation,
    args: Args,
    user_input: Vec<String>,
    budget: TimeBudget,
    cancel_grace: Duration,
    flags: EchoFlags,
    expectations: Expectations,
    expect_success: bool,
    status: StatusPrinter,
    echo: Arc<dyn RealConsole>,
    outcome: Outcome,
}

impl TestCase {
    pub fn new(operation: Operation) -> Self {
        Self {
            name: "Untitled".to_string(),
            operation,
            args: Args::default(),
            user_input: Vec::new(),
            budget: TimeBudget::default(),
            cancel_grace: DEFAULT_CANCEL_GRACE,
            flags: EchoFlags::default(),
            expectations: Expectations::default(),
            expect_success: true,
            status: StatusPrinter::default(),
            echo: Arc::new(StdConsole),
            outcome: Outcome::default(),
        }
    }

    /// Apply engine-wide defaults (budget, grace period, echo flags).
    pub fn with_engine_config(mut self, config: &EngineConfig) -> Self {
        self.budget = config.budget();
        self.cancel_grace = config.cancel_grace();
        self.flags = config.flags();
        self
    }

    /// Apply a configuration record and return `self` for chaining.
    pub fn configure(mut self, config: CaseConfig) -> Self {
        if let Some(name) = config.name {
            self.name = name;
        }
        if let Some(timeout) = config.timeout {
            self.budget = TimeBudget::from_secs_f64(timeout);
        }
        if let Some(user_input) = config.user_input {
            self.user_input = script_from_json(user_input);
        }
        if let Some(print_input) = config.print_input {
            self.flags.print_input = print_input;
        }
        if let Some(capture_input) = config.capture_input {
            self.flags.capture_input = capture_input;
        }
        if let Some(print_out) = config.print_out {
            self.flags.print_out = print_out;
        }
        if let Some(print_err) = config.print_err {
            self.flags.print_err = print_err;
        }
        if let Some(expect_out) = config.expect_out {
            self.expectations.stdout = Expectation::output_from_json(&expect_out);
        }
        if let Some(expect_err) = config.expect_err {
            self.expectations.stderr = Expectation::output_from_json(&expect_err);
        }
        if let Some(expect_rval) = config.expect_rval {
            self.expectations.rval = Expectation::return_from_json(expect_rval);
        }
        if let Some(expect_success) = config.expect_success {
            self.expect_success = expect_success;
        }
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn timeout(mut self, budget: TimeBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn user_input<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_input = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn flags(mut self, flags: EchoFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn expect_out(mut self, expected: impl Into<String>) -> Self {
        self.expectations.stdout = Expectation::Text(expected.into());
        self
    }

    pub fn expect_err(mut self, expected: impl Into<String>) -> Self {
        self.expectations.stderr = Expectation::Text(expected.into());
        self
    }

    pub fn expect_rval(mut self, expected: Value) -> Self {
        self.expectations.rval = Expectation::Value(expected);
        self
    }

    pub fn expect_success(mut self, expected: bool) -> Self {
        self.expect_success = expected;
        self
    }

    /// Replace the status printer (e.g. [`StatusPrinter::silent`]).
    pub fn status(mut self, status: StatusPrinter) -> Self {
        self.status = status;
        self
    }

    /// Redirect echoed console traffic.
    pub fn echo_to(mut self, echo: Arc<dyn RealConsole>) -> Self {
        self.echo = echo;
        self
    }

    /// Replace the call arguments.
    pub fn set_args(mut self, positional: Vec<Value>, keyword: Map<String, Value>) -> Self {
        self.args = Args::new(positional, keyword);
        self
    }

    /// Run the operation once.
    ///
    /// Returns the return value (`None` when the run failed before returning).
    /// When the result does not match `expect_success` and the run raised, the
    /// captured exception is returned as the error after it is reported.
    pub fn run(&mut self) -> Result<Option<Value>, ExceptionInfo> {
        self.status.running(&self.name);
        self.outcome = Outcome::default();
        info!(case = %self.name, operation = self.operation.name(), "test case started");

        let request = ExecRequest {
            operation: self.operation.clone(),
            args: self.args.clone(),
            script: self.user_input.iter().cloned().collect(),
            flags: self.flags,
            budget: self.budget,
            cancel_grace: self.cancel_grace,
            echo: self.echo.clone(),
        };
        let execution = execute(&request);
        self.record(&execution);

        if let Some(exception) = &self.outcome.exception {
            self.status.exception(exception);
        } else {
            let comparison = compare(&execution, &self.expectations);
            self.outcome.success = comparison.success;
            self.outcome.diff = comparison.diff;
        }

        let matched = self.outcome.success == self.expect_success;
        debug!(
            case = %self.name,
            actual = self.outcome.success,
            expected = self.expect_success,
            "comparison finished"
        );
        if matched {
            self.outcome.success = true;
            self.status.passed();
        } else {
            self.outcome.success = false;
            if let Some(exception) = &self.outcome.exception {
                self.status.failed(None);
                return Err(exception.clone());
            }
            self.status.failed(Some(&self.outcome.diff));
        }
        info!(case = %self.name, success = self.outcome.success, "test case finished");
        Ok(self.outcome.rval.clone())
    }

    fn record(&mut self, execution: &Execution) {
        self.outcome.stdout = execution.captured.stdout.clone();
        self.outcome.stderr = execution.captured.stderr.clone();
        self.outcome.rval = execution.return_value().cloned();
        self.outcome.exception = execution.exception().cloned();
    }

    pub fn case_name(&self) -> &str {
        &self.name
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn stdout(&self) -> &str {
        &self.outcome.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.outcome.stderr
    }

    pub fn rval(&self) -> Option<&Value> {
        self.outcome.rval.as_ref()
    }

    pub fn success(&self) -> bool {
        self.outcome.success
    }

    pub fn diff(&self) -> &str {
        &self.outcome.diff
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.outcome.exception.as_ref()
    }
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only an absent key is `None`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Scripted input from a JSON value: a sequence, or a single value.
fn script_from_json(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(script_value).collect(),
        other => vec![script_value(&other)],
    }
}

/// Text a console program would see for a scripted value. Booleans read as
/// `True` / `False`, strings verbatim, numbers in their JSON form.
fn script_value(value: &Value) -> String {
    match value {
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        other => plain(other),
    }
}
