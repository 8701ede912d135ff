//! Console capture for one execution.
//!
//! Operations receive a [`Console`] handle and do their I/O through it: every
//! write lands in an in-memory buffer (optionally echoed to the real console)
//! and every input request consumes the next scripted value. Code that cannot
//! take a handle can use the free functions in this module ([`print`],
//! [`input`], ...), which route through the [`CaptureSession`] installed on the
//! current thread and fall back to the real console otherwise.
//!
//! Every console call is a cancellation safe point.

use std::cell::RefCell;
use std::fmt;
use std::io::{BufRead, Write};
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::style::{DARK_CYAN, DARK_MAGENTA, RESET, UNDERLINE};
use crate::core::types::Captured;
use crate::error::EngineError;
use crate::io::cancel::CancelToken;

/// Echo and fold flags for one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoFlags {
    /// Echo consumed scripted values to the real console.
    pub print_input: bool,
    /// Fold `prompt + value` into captured stdout.
    pub capture_input: bool,
    /// Forward captured stdout to the real console.
    pub print_out: bool,
    /// Forward captured stderr to the real console.
    pub print_err: bool,
}

impl Default for EchoFlags {
    fn default() -> Self {
        Self {
            print_input: true,
            capture_input: true,
            print_out: true,
            print_err: true,
        }
    }
}

impl EchoFlags {
    /// All echoing disabled, scripted input still folded into stdout.
    pub fn silent() -> Self {
        Self {
            print_input: false,
            capture_input: true,
            print_out: false,
            print_err: false,
        }
    }
}

/// Destination for echoed console traffic.
pub trait RealConsole: Send + Sync {
    fn write_out(&self, text: &str);
    fn write_err(&self, text: &str);
}

impl fmt::Debug for dyn RealConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RealConsole")
    }
}

/// The process's actual stdout/stderr.
#[derive(Debug)]
pub struct StdConsole;

impl RealConsole for StdConsole {
    fn write_out(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
            warn!(err = %err, "failed to echo stdout");
        }
    }

    fn write_err(&self, text: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(err) = stderr.write_all(text.as_bytes()).and_then(|()| stderr.flush()) {
            warn!(err = %err, "failed to echo stderr");
        }
    }
}

#[derive(Debug, Default)]
struct Buffers {
    stdout: String,
    stderr: String,
    cursor: usize,
}

struct ConsoleState {
    script: Arc<[String]>,
    buffers: Mutex<Buffers>,
    flags: EchoFlags,
    echo: Arc<dyn RealConsole>,
    cancel: CancelToken,
}

/// Intercepting console for one execution. Clones share the same buffers.
#[derive(Clone)]
pub struct Console {
    inner: Arc<ConsoleState>,
}

impl fmt::Debug for Console {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Console")
            .field("script_len", &self.inner.script.len())
            .field("flags", &self.inner.flags)
            .finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(
        script: Arc<[String]>,
        flags: EchoFlags,
        echo: Arc<dyn RealConsole>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            inner: Arc::new(ConsoleState {
                script,
                buffers: Mutex::new(Buffers::default()),
                flags,
                echo,
                cancel,
            }),
        }
    }

    /// Console with a script, no echoing and a fresh token. Handy for tests.
    pub fn scripted<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script: Arc<[String]> = inputs.into_iter().map(Into::into).collect();
        Self::new(
            script,
            EchoFlags::silent(),
            Arc::new(StdConsole),
            CancelToken::new(),
        )
    }

    fn buffers(&self) -> std::sync::MutexGuard<'_, Buffers> {
        self.inner
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Write to stdout.
    pub fn print(&self, text: impl AsRef<str>) -> Result<(), EngineError> {
        self.inner.cancel.check()?;
        let text = text.as_ref();
        self.buffers().stdout.push_str(text);
        if self.inner.flags.print_out {
            self.inner.echo.write_out(text);
        }
        Ok(())
    }

    pub fn println(&self, text: impl AsRef<str>) -> Result<(), EngineError> {
        self.print(format!("{}\n", text.as_ref()))
    }

    /// Write to stderr.
    pub fn eprint(&self, text: impl AsRef<str>) -> Result<(), EngineError> {
        self.inner.cancel.check()?;
        let text = text.as_ref();
        self.buffers().stderr.push_str(text);
        if self.inner.flags.print_err {
            self.inner
                .echo
                .write_err(&format!("{DARK_MAGENTA}{text}{RESET}"));
        }
        Ok(())
    }

    pub fn eprintln(&self, text: impl AsRef<str>) -> Result<(), EngineError> {
        self.eprint(format!("{}\n", text.as_ref()))
    }

    /// Consume the next scripted value.
    ///
    /// Fails with [`EngineError::ExhaustedInput`] once the script is used up;
    /// never reads the real console.
    pub fn input(&self, prompt: &str) -> Result<String, EngineError> {
        self.inner.cancel.check()?;
        let flags = self.inner.flags;
        let value = {
            let mut buffers = self.buffers();
            let Some(value) = self.inner.script.get(buffers.cursor).cloned() else {
                return Err(EngineError::ExhaustedInput {
                    provided: self.inner.script.len(),
                });
            };
            buffers.cursor += 1;
            if flags.capture_input {
                buffers.stdout.push_str(&format!("{prompt}{value}\n"));
            }
            value
        };
        if flags.print_input {
            let lead = if flags.capture_input { "" } else { DARK_CYAN };
            self.inner
                .echo
                .write_out(&format!("{lead}{prompt}{UNDERLINE}{value}{RESET}\n"));
        }
        Ok(value)
    }

    /// Interruptible sleep.
    pub fn sleep(&self, duration: Duration) -> Result<(), EngineError> {
        self.inner.cancel.sleep(duration)
    }

    /// Explicit cancellation safe point for long computations.
    pub fn checkpoint(&self) -> Result<(), EngineError> {
        self.inner.cancel.check()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.inner.cancel
    }

    /// Number of scripted values consumed so far.
    pub fn inputs_consumed(&self) -> usize {
        self.buffers().cursor
    }

    /// Point-in-time copy of the captured streams.
    pub fn snapshot(&self) -> Captured {
        let buffers = self.buffers();
        Captured {
            stdout: buffers.stdout.clone(),
            stderr: buffers.stderr.clone(),
        }
    }
}

thread_local! {
    static ACTIVE: RefCell<Option<Console>> = const { RefCell::new(None) };
}

/// Installs a [`Console`] as the current thread's console binding until dropped.
///
/// Only one session may be installed per thread; a second install fails with
/// [`EngineError::SessionActive`]. The guard is `!Send` so it is always
/// released on the thread that installed it.
#[derive(Debug)]
pub struct CaptureSession {
    console: Console,
    _thread_bound: PhantomData<*const ()>,
}

impl CaptureSession {
    pub fn install(console: Console) -> Result<Self, EngineError> {
        ACTIVE.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return Err(EngineError::SessionActive);
            }
            *slot = Some(console.clone());
            Ok(())
        })?;
        debug!("capture session installed");
        Ok(Self {
            console,
            _thread_bound: PhantomData,
        })
    }

    pub fn console(&self) -> &Console {
        &self.console
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        // `try_with` because the session may be dropped during thread teardown.
        let _ = ACTIVE.try_with(|slot| slot.borrow_mut().take());
        debug!("capture session restored");
    }
}

/// Whether a capture session is installed on the current thread.
pub fn session_active() -> bool {
    ACTIVE.with(|slot| slot.borrow().is_some())
}

fn current() -> Option<Console> {
    ACTIVE.with(|slot| slot.borrow().clone())
}

/// Write to the current thread's console binding.
pub fn print(text: impl AsRef<str>) -> Result<()> {
    match current() {
        Some(console) => Ok(console.print(text)?),
        None => {
            StdConsole.write_out(text.as_ref());
            Ok(())
        }
    }
}

pub fn println(text: impl AsRef<str>) -> Result<()> {
    print(format!("{}\n", text.as_ref()))
}

/// Write to the current thread's error binding.
pub fn eprint(text: impl AsRef<str>) -> Result<()> {
    match current() {
        Some(console) => Ok(console.eprint(text)?),
        None => {
            StdConsole.write_err(text.as_ref());
            Ok(())
        }
    }
}

pub fn eprintln(text: impl AsRef<str>) -> Result<()> {
    eprint(format!("{}\n", text.as_ref()))
}

/// Read a line: the next scripted value inside a session, the real stdin otherwise.
pub fn input(prompt: &str) -> Result<String> {
    if let Some(console) = current() {
        return Ok(console.input(prompt)?);
    }
    StdConsole.write_out(prompt);
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read stdin")?;
    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);
    Ok(line)
}

/// Sleep, interruptible by the current session's cancellation.
pub fn sleep(duration: Duration) -> Result<()> {
    match current() {
        Some(console) => Ok(console.sleep(duration)?),
        None => {
            std::thread::sleep(duration);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingConsole;

    fn recording(script: &[&str], flags: EchoFlags) -> (Console, Arc<RecordingConsole>) {
        let echo = Arc::new(RecordingConsole::default());
        let script: Arc<[String]> = script.iter().map(|s| s.to_string()).collect();
        let console = Console::new(script, flags, echo.clone(), CancelToken::new());
        (console, echo)
    }

    #[test]
    fn exactly_n_inputs_succeed() {
        for n in 0..4 {
            let script: Vec<String> = (0..n).map(|i| i.to_string()).collect();
            let console = Console::scripted(script.clone());
            for expected in &script {
                assert_eq!(&console.input("> ").expect("scripted"), expected);
            }
            let err = console.input("> ").expect_err("exhausted");
            assert!(matches!(err, EngineError::ExhaustedInput { provided } if provided == n));
            assert_eq!(console.inputs_consumed(), n);
        }
    }

    #[test]
    fn capture_input_folds_prompt_and_value() {
        let (console, echo) = recording(&["7"], EchoFlags::silent());
        console.input("n? ").expect("input");
        console.println("got 7").expect("print");
        assert_eq!(console.snapshot().stdout, "n? 7\ngot 7\n");
        assert!(echo.out().is_empty());
    }

    #[test]
    fn unfolded_input_is_echoed_underlined() {
        let flags = EchoFlags {
            print_input: true,
            capture_input: false,
            print_out: false,
            print_err: false,
        };
        let (console, echo) = recording(&["7"], flags);
        console.input("n? ").expect("input");
        assert_eq!(console.snapshot().stdout, "");
        assert_eq!(echo.out(), format!("{DARK_CYAN}n? {UNDERLINE}7{RESET}\n"));
    }

    #[test]
    fn echo_flags_forward_streams() {
        let flags = EchoFlags {
            print_input: false,
            capture_input: false,
            print_out: true,
            print_err: true,
        };
        let (console, echo) = recording(&[], flags);
        console.print("out").expect("print");
        console.eprint("err").expect("eprint");
        let captured = console.snapshot();
        assert_eq!(captured.stdout, "out");
        assert_eq!(captured.stderr, "err");
        assert_eq!(echo.out(), "out");
        assert_eq!(echo.err(), format!("{DARK_MAGENTA}err{RESET}"));
    }

    #[test]
    fn writes_fail_after_cancellation() {
        let console = Console::scripted(["a"]);
        console.cancel_token().cancel();
        assert!(matches!(console.print("x"), Err(EngineError::Cancelled)));
        assert!(matches!(console.input(""), Err(EngineError::Cancelled)));
        assert_eq!(console.snapshot(), Captured::default());
    }

    #[test]
    fn session_routes_free_functions_and_restores() {
        let console = Console::scripted(["hi"]);
        {
            let _session = CaptureSession::install(console.clone()).expect("install");
            assert!(session_active());
            let value = input("say: ").expect("input");
            println(format!("echo {value}")).expect("println");
            eprintln("warned").expect("eprintln");
        }
        assert!(!session_active());
        let captured = console.snapshot();
        assert_eq!(captured.stdout, "say: hi\necho hi\n");
        assert_eq!(captured.stderr, "warned\n");
    }

    #[test]
    fn second_session_on_same_thread_is_rejected() {
        let first = CaptureSession::install(Console::scripted(Vec::<String>::new()))
            .expect("first install");
        let err = CaptureSession::install(Console::scripted(Vec::<String>::new()))
            .expect_err("nested install");
        assert!(matches!(err, EngineError::SessionActive));
        drop(first);
        assert!(!session_active());
        let _again = CaptureSession::install(Console::scripted(Vec::<String>::new()))
            .expect("install after restore");
    }

    #[test]
    fn session_is_restored_after_panic() {
        let result = std::panic::catch_unwind(|| {
            let _session =
                CaptureSession::install(Console::scripted(Vec::<String>::new())).expect("install");
            panic!("operation blew up");
        });
        assert!(result.is_err());
        assert!(!session_active());
    }
}
