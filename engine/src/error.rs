//! Error kinds raised by the engine and by operations under test.
//!
//! [`EngineError`] covers failures the engine itself produces (exhausted
//! script, timeout, cancellation). [`OperationError`] lets an operation tag a
//! failure with its own kind. Both collapse into an [`ExceptionInfo`] once a
//! run is over, which is what callers inspect.

use std::any::Any;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures produced by the engine while supervising an operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The operation requested more scripted input than the case provides.
    #[error("too many input requests ({provided} scripted value(s) provided)")]
    ExhaustedInput { provided: usize },
    /// The worker did not finish inside its time budget.
    #[error("test timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    /// Raised at a safe point once cancellation was requested.
    #[error("operation cancelled")]
    Cancelled,
    /// A capture session was already installed on the current thread.
    #[error("a capture session is already installed on this thread")]
    SessionActive,
    #[error("spawn worker thread")]
    WorkerSpawn(#[source] std::io::Error),
}

impl EngineError {
    /// Stable kind tag reported in [`ExceptionInfo::kind`].
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::ExhaustedInput { .. } => "ExhaustedInputError",
            EngineError::Timeout { .. } => "TestTimeoutError",
            EngineError::Cancelled => "CancelledError",
            EngineError::SessionActive => "CaptureSessionError",
            EngineError::WorkerSpawn(_) => "WorkerSpawnError",
        }
    }
}

/// A failure raised by an operation with an explicit kind tag.
///
/// Operations return it through `anyhow` (`Err(OperationError::new(..).into())`);
/// the kind survives any `.context(..)` layered on top.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct OperationError {
    pub kind: String,
    pub message: String,
}

impl OperationError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// Descriptor of a failure captured during one run.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ExceptionInfo {
    /// Kind tag (`ExhaustedInputError`, `TestTimeoutError`, an operation's own kind, ...).
    pub kind: String,
    /// Top-level message.
    pub message: String,
    /// Underlying causes, outermost first. Only the operation's own error
    /// chain appears here.
    pub trace: Vec<String>,
}

impl ExceptionInfo {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            trace: Vec::new(),
        }
    }

    /// Build a descriptor from an error returned by an operation.
    ///
    /// The kind is taken from the first [`EngineError`] or [`OperationError`]
    /// found in the chain, falling back to `Error`.
    pub fn from_error(err: &anyhow::Error) -> Self {
        let kind = err
            .chain()
            .find_map(|cause| {
                cause
                    .downcast_ref::<EngineError>()
                    .map(|engine| engine.kind().to_string())
                    .or_else(|| {
                        cause
                            .downcast_ref::<OperationError>()
                            .map(|raised| raised.kind.clone())
                    })
            })
            .unwrap_or_else(|| "Error".to_string());
        Self {
            kind,
            message: err.to_string(),
            trace: err.chain().skip(1).map(|cause| cause.to_string()).collect(),
        }
    }

    pub fn from_engine(err: &EngineError) -> Self {
        Self::new(err.kind(), err.to_string())
    }

    /// Build a descriptor from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new("Panic", message)
    }

    /// Whether this descriptor records a timeout.
    pub fn is_timeout(&self) -> bool {
        self.kind == "TestTimeoutError"
    }

    /// Multi-line rendering: `kind: message` followed by the cause chain.
    pub fn render(&self) -> String {
        let mut buf = format!("{}: {}", self.kind, self.message);
        for cause in &self.trace {
            buf.push_str("\n  caused by: ");
            buf.push_str(cause);
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn kind_survives_context_layers() {
        let err = anyhow::Error::from(OperationError::new("RuntimeError", "boom"))
            .context("while computing");
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.kind, "RuntimeError");
        assert_eq!(info.message, "while computing");
        assert_eq!(info.trace, vec!["boom".to_string()]);
    }

    #[test]
    fn engine_errors_map_to_their_kind() {
        let err: anyhow::Error = EngineError::ExhaustedInput { provided: 2 }.into();
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.kind, "ExhaustedInputError");
        assert!(info.message.contains("too many input requests"));
    }

    #[test]
    fn untagged_errors_default_to_error_kind() {
        let err = Err::<(), _>(std::io::Error::other("disk"))
            .context("read file")
            .unwrap_err();
        let info = ExceptionInfo::from_error(&err);
        assert_eq!(info.kind, "Error");
        assert_eq!(info.render(), "Error: read file\n  caused by: disk");
    }

    #[test]
    fn panic_payloads_are_stringified() {
        let info = ExceptionInfo::from_panic(Box::new("bad index"));
        assert_eq!(info.kind, "Panic");
        assert_eq!(info.message, "bad index");
        let info = ExceptionInfo::from_panic(Box::new(String::from("owned")));
        assert_eq!(info.message, "owned");
    }

    #[test]
    fn timeout_descriptor_is_recognised() {
        let info = ExceptionInfo::from_engine(&EngineError::Timeout {
            timeout: Duration::from_secs(5),
        });
        assert!(info.is_timeout());
        assert_eq!(info.message, "test timed out after 5s");
    }
}
