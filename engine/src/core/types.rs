//! Shared types describing one execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExceptionInfo;

/// Console text captured during one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
}

/// How a run ended. Exactly one of these terminates every execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The operation returned normally.
    Returned(Value),
    /// The operation failed (error, panic, exhausted script).
    Raised(ExceptionInfo),
    /// The worker exceeded its budget and was cancelled or abandoned.
    TimedOut(ExceptionInfo),
    /// The worker went away without reporting; there is no return value.
    NoOutcome,
}

/// Result of a supervised execution, before comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub termination: Termination,
    pub captured: Captured,
}

impl Execution {
    /// Return value, or `None` when the run failed before returning.
    pub fn return_value(&self) -> Option<&Value> {
        match &self.termination {
            Termination::Returned(value) => Some(value),
            Termination::Raised(_) | Termination::TimedOut(_) | Termination::NoOutcome => None,
        }
    }

    /// Exception descriptor for failed or timed-out runs.
    pub fn exception(&self) -> Option<&ExceptionInfo> {
        match &self.termination {
            Termination::Returned(_) | Termination::NoOutcome => None,
            Termination::Raised(info) | Termination::TimedOut(info) => Some(info),
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.termination, Termination::TimedOut(_))
    }
}
