//! Single-use handoff of a worker's outcome to its supervisor.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender};
use std::time::Duration;

use serde_json::Value;

use crate::core::types::Captured;
use crate::error::ExceptionInfo;

/// Everything a worker hands back, sent exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerReport {
    Returned { value: Value, captured: Captured },
    Raised { exception: ExceptionInfo, captured: Captured },
}

/// Producer half. Sending consumes it, so a worker reports at most once.
#[derive(Debug)]
pub struct ReportSender {
    tx: SyncSender<WorkerReport>,
}

/// Consumer half, owned by the supervisor.
#[derive(Debug)]
pub struct ReportReceiver {
    rx: Receiver<WorkerReport>,
}

/// State of the channel after a bounded wait.
#[derive(Debug, PartialEq)]
pub enum Handoff {
    /// The worker delivered its report.
    Delivered(WorkerReport),
    /// Nothing yet; the worker may still be running.
    Pending,
    /// The worker went away without reporting.
    Closed,
}

/// Create a fresh channel for one run.
pub fn report_channel() -> (ReportSender, ReportReceiver) {
    let (tx, rx) = mpsc::sync_channel(1);
    (ReportSender { tx }, ReportReceiver { rx })
}

impl ReportSender {
    /// Hand the report over. Returns `false` when the supervisor has already
    /// gone (the report is dropped).
    pub fn send(self, report: WorkerReport) -> bool {
        self.tx.send(report).is_ok()
    }
}

impl ReportReceiver {
    /// Wait up to `timeout` for the report.
    pub fn wait(&self, timeout: Duration) -> Handoff {
        match self.rx.recv_timeout(timeout) {
            Ok(report) => Handoff::Delivered(report),
            Err(RecvTimeoutError::Timeout) => Handoff::Pending,
            Err(RecvTimeoutError::Disconnected) => Handoff::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn report_crosses_threads_once() {
        let (tx, rx) = report_channel();
        let handle = thread::spawn(move || {
            tx.send(WorkerReport::Returned {
                value: Value::from(3),
                captured: Captured::default(),
            })
        });
        assert!(handle.join().expect("join"));
        assert_eq!(
            rx.wait(Duration::from_secs(1)),
            Handoff::Delivered(WorkerReport::Returned {
                value: Value::from(3),
                captured: Captured::default(),
            })
        );
        assert_eq!(rx.wait(Duration::from_millis(10)), Handoff::Closed);
    }

    #[test]
    fn pending_until_worker_reports() {
        let (tx, rx) = report_channel();
        assert_eq!(rx.wait(Duration::from_millis(10)), Handoff::Pending);
        drop(tx);
        assert_eq!(rx.wait(Duration::from_millis(10)), Handoff::Closed);
    }

    #[test]
    fn send_after_supervisor_left_is_reported() {
        let (tx, rx) = report_channel();
        drop(rx);
        assert!(!tx.send(WorkerReport::Raised {
            exception: ExceptionInfo::new("Error", "late"),
            captured: Captured::default(),
        }));
    }
}
