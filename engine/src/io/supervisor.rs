//! Bounded execution of an operation under console capture.
//!
//! Without a budget the operation runs inline on the caller's thread. With a
//! budget it runs on a fresh worker thread; on expiry the supervisor requests
//! cooperative cancellation, waits a grace period, and detaches the worker if
//! it still has not stopped. A detached worker keeps running until it reaches a
//! safe point or finishes; its thread is leaked, never blocked on.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, instrument, warn};

use crate::core::budget::TimeBudget;
use crate::core::types::{Captured, Execution, Termination};
use crate::error::{EngineError, ExceptionInfo};
use crate::io::cancel::CancelToken;
use crate::io::channel::{Handoff, WorkerReport, report_channel};
use crate::io::console::{CaptureSession, Console, EchoFlags, RealConsole, StdConsole};
use crate::operation::{Args, Operation};

/// How long a cancelled worker gets to reach a safe point before it is detached.
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Parameters for one supervised execution.
#[derive(Clone)]
pub struct ExecRequest {
    pub operation: Operation,
    pub args: Args,
    /// Scripted input, frozen for the duration of the run.
    pub script: Arc<[String]>,
    pub flags: EchoFlags,
    pub budget: TimeBudget,
    pub cancel_grace: Duration,
    /// Where echoed traffic goes.
    pub echo: Arc<dyn RealConsole>,
}

impl std::fmt::Debug for ExecRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecRequest")
            .field("operation", &self.operation)
            .field("args", &self.args)
            .field("script", &self.script)
            .field("flags", &self.flags)
            .field("budget", &self.budget)
            .field("cancel_grace", &self.cancel_grace)
            .finish_non_exhaustive()
    }
}

impl ExecRequest {
    /// Request with no script, default flags and budget, echoing to the real console.
    pub fn new(operation: Operation, args: Args) -> Self {
        Self {
            operation,
            args,
            script: Arc::from(Vec::new()),
            flags: EchoFlags::default(),
            budget: TimeBudget::default(),
            cancel_grace: DEFAULT_CANCEL_GRACE,
            echo: Arc::new(StdConsole),
        }
    }

    fn console(&self, cancel: CancelToken) -> Console {
        Console::new(self.script.clone(), self.flags, self.echo.clone(), cancel)
    }
}

/// Run the operation once and report how it ended.
///
/// Never panics or returns an error: operation failures, panics and timeouts
/// all become [`Termination`] variants.
#[instrument(skip_all, fields(operation = request.operation.name(), budget = ?request.budget))]
pub fn execute(request: &ExecRequest) -> Execution {
    match request.budget.limit() {
        None => execute_inline(request),
        Some(timeout) => execute_timed(request, timeout),
    }
}

fn execute_inline(request: &ExecRequest) -> Execution {
    debug!("running inline");
    let console = request.console(CancelToken::new());
    let termination = match run_captured(&console, &request.operation, &request.args) {
        Ok(value) => Termination::Returned(value),
        Err(exception) => Termination::Raised(exception),
    };
    Execution {
        termination,
        captured: console.snapshot(),
    }
}

fn execute_timed(request: &ExecRequest, timeout: Duration) -> Execution {
    let cancel = CancelToken::new();
    let console = request.console(cancel.clone());
    let (tx, rx) = report_channel();

    let worker_console = console.clone();
    let operation = request.operation.clone();
    let args = request.args.clone();
    let spawned = thread::Builder::new()
        .name(format!("worker-{}", operation.name()))
        .spawn(move || {
            let result = run_captured(&worker_console, &operation, &args);
            let captured = worker_console.snapshot();
            let report = match result {
                Ok(value) => WorkerReport::Returned { value, captured },
                Err(exception) => WorkerReport::Raised {
                    exception,
                    captured,
                },
            };
            if !tx.send(report) {
                debug!("supervisor left before the report was sent");
            }
        });
    let handle = match spawned {
        Ok(handle) => handle,
        Err(err) => {
            error!(err = %err, "failed to spawn worker");
            return Execution {
                termination: Termination::Raised(ExceptionInfo::from_engine(
                    &EngineError::WorkerSpawn(err),
                )),
                captured: Captured::default(),
            };
        }
    };
    debug!(timeout_ms = timeout.as_millis() as u64, "worker started");

    match rx.wait(timeout) {
        Handoff::Delivered(report) => {
            join_worker(handle);
            from_report(report)
        }
        Handoff::Closed => {
            join_worker(handle);
            no_outcome(&console)
        }
        Handoff::Pending => {
            let delivered = cancel.cancel();
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                delivered, "worker exceeded its budget, cancelling"
            );
            let mut exception = ExceptionInfo::from_engine(&EngineError::Timeout { timeout });
            let captured = match rx.wait(request.cancel_grace) {
                Handoff::Delivered(report) => {
                    join_worker(handle);
                    report_captured(report)
                }
                Handoff::Closed => {
                    join_worker(handle);
                    console.snapshot()
                }
                Handoff::Pending => {
                    warn!(
                        grace_ms = request.cancel_grace.as_millis() as u64,
                        observed = cancel.was_observed(),
                        "worker ignored cancellation, detaching"
                    );
                    drop(handle);
                    exception.trace.push(format!(
                        "worker did not stop within {:?} of cancellation and was detached",
                        request.cancel_grace
                    ));
                    console.snapshot()
                }
            };
            Execution {
                termination: Termination::TimedOut(exception),
                captured,
            }
        }
    }
}

/// Run the operation inside a capture session on the current thread.
fn run_captured(console: &Console, operation: &Operation, args: &Args) -> Result<Value, ExceptionInfo> {
    let session = CaptureSession::install(console.clone())
        .map_err(|err| ExceptionInfo::from_engine(&err))?;
    let result = panic::catch_unwind(AssertUnwindSafe(|| operation.call(console, args)));
    drop(session);
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ExceptionInfo::from_error(&err)),
        Err(payload) => Err(ExceptionInfo::from_panic(payload)),
    }
}

fn from_report(report: WorkerReport) -> Execution {
    match report {
        WorkerReport::Returned { value, captured } => Execution {
            termination: Termination::Returned(value),
            captured,
        },
        WorkerReport::Raised {
            exception,
            captured,
        } => Execution {
            termination: Termination::Raised(exception),
            captured,
        },
    }
}

fn no_outcome(console: &Console) -> Execution {
    warn!("worker exited without a report");
    Execution {
        termination: Termination::NoOutcome,
        captured: console.snapshot(),
    }
}

fn report_captured(report: WorkerReport) -> Captured {
    match report {
        WorkerReport::Returned { captured, .. } | WorkerReport::Raised { captured, .. } => captured,
    }
}

fn join_worker(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        warn!("worker thread panicked outside the operation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::console;
    use serde_json::json;
    use std::time::Instant;

    fn request(operation: Operation, budget: TimeBudget) -> ExecRequest {
        ExecRequest {
            flags: EchoFlags::silent(),
            budget,
            cancel_grace: Duration::from_millis(500),
            ..ExecRequest::new(operation, Args::default())
        }
    }

    #[test]
    fn inline_run_captures_return_and_output() {
        let op = Operation::new("hello", |console, _| {
            console.println("hi")?;
            console.eprintln("careful")?;
            Ok(json!(7))
        });
        let execution = execute(&request(op, TimeBudget::Unlimited));
        assert_eq!(execution.termination, Termination::Returned(json!(7)));
        assert_eq!(execution.captured.stdout, "hi\n");
        assert_eq!(execution.captured.stderr, "careful\n");
    }

    #[test]
    fn timed_run_reports_through_channel() {
        let op = Operation::new("quick", |console, _| {
            console::println("implicit console")?;
            Ok(json!("done"))
        });
        let execution = execute(&request(op, TimeBudget::Limited(Duration::from_secs(5))));
        assert_eq!(execution.return_value(), Some(&json!("done")));
        assert_eq!(execution.captured.stdout, "implicit console\n");
    }

    #[test]
    fn errors_and_panics_become_exceptions() {
        let failing = Operation::new("fail", |_, _| anyhow::bail!("nope"));
        let execution = execute(&request(failing, TimeBudget::Unlimited));
        let exception = execution.exception().expect("exception");
        assert_eq!(exception.message, "nope");

        let panicking = Operation::new("panic", |_, _| panic!("kaboom"));
        let execution = execute(&request(panicking, TimeBudget::Limited(Duration::from_secs(5))));
        let exception = execution.exception().expect("exception");
        assert_eq!(exception.kind, "Panic");
        assert_eq!(exception.message, "kaboom");
    }

    #[test]
    fn cooperative_worker_is_cancelled_on_timeout() {
        let op = Operation::new("ticker", |console, _| loop {
            console.println("tick")?;
            console.sleep(Duration::from_millis(50))?;
        });
        let start = Instant::now();
        let execution = execute(&request(op, TimeBudget::Limited(Duration::from_millis(200))));
        assert!(execution.timed_out());
        let exception = execution.exception().expect("timeout exception");
        assert_eq!(exception.kind, "TestTimeoutError");
        assert!(exception.trace.is_empty(), "worker should not be detached");
        assert!(execution.captured.stdout.starts_with("tick\n"));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn uncooperative_worker_is_detached_after_grace() {
        let op = Operation::new("stubborn", |_, _| {
            std::thread::sleep(Duration::from_millis(1500));
            Ok(Value::Null)
        });
        let mut req = request(op, TimeBudget::Limited(Duration::from_millis(100)));
        req.cancel_grace = Duration::from_millis(100);
        let start = Instant::now();
        let execution = execute(&req);
        assert!(execution.timed_out());
        let exception = execution.exception().expect("timeout exception");
        assert!(exception.trace[0].contains("detached"));
        assert!(start.elapsed() < Duration::from_millis(1200));
    }

    #[test]
    fn missing_report_leaves_return_value_unset() {
        let console = Console::scripted(Vec::<String>::new());
        console.println("partial").expect("print");
        let execution = no_outcome(&console);
        assert_eq!(execution.termination, Termination::NoOutcome);
        assert_eq!(execution.return_value(), None);
        assert_eq!(execution.exception(), None);
        assert_eq!(execution.captured.stdout, "partial\n");
    }

    #[test]
    fn each_run_gets_fresh_capture() {
        let op = Operation::new("echo", |console, _| {
            let line = console.input("> ")?;
            Ok(json!(line))
        });
        let mut req = request(op, TimeBudget::Unlimited);
        req.script = Arc::from(vec!["x".to_string()]);
        let first = execute(&req);
        let second = execute(&req);
        assert_eq!(first, second);
        assert_eq!(first.captured.stdout, "> x\n");
    }
}
