//! Console-program test engine.
//!
//! A [`TestCase`] runs one operation of a program under test with scripted
//! console input, captures everything it writes, bounds its wall-clock time,
//! and compares the captured output and return value against expectations.
//! The crate keeps the usual split:
//!
//! - **[`core`]**: Pure logic (budgets, expectations, diffing, comparison).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Console capture, worker supervision, config files and status
//!   output.
//!
//! [`case`] orchestrates the two for a single test; [`operation`] defines what
//! a program under test looks like.

pub mod case;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod operation;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use case::{CaseConfig, Outcome, TestCase};
pub use crate::core::budget::TimeBudget;
pub use error::{EngineError, ExceptionInfo, OperationError};
pub use io::console::{CaptureSession, Console, EchoFlags};
pub use operation::{Args, Namespace, Operation};
