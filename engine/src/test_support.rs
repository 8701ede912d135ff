//! Test-only helpers: a recording echo target and small operations.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};

use crate::case::TestCase;
use crate::io::console::{EchoFlags, RealConsole};
use crate::io::status::StatusPrinter;
use crate::operation::Operation;

/// Echo target that records what would have reached the real console.
#[derive(Debug, Default)]
pub struct RecordingConsole {
    out: Mutex<String>,
    err: Mutex<String>,
}

impl RecordingConsole {
    pub fn out(&self) -> String {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn err(&self) -> String {
        self.err
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RealConsole for RecordingConsole {
    fn write_out(&self, text: &str) {
        self.out
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }

    fn write_err(&self, text: &str) {
        self.err
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }
}

/// Test case with echoing and status output turned off.
pub fn quiet_case(operation: Operation) -> TestCase {
    TestCase::new(operation)
        .flags(EchoFlags::silent())
        .status(StatusPrinter::silent())
}

/// Prints `Hello`, then sleeps `ticks` times for `tick` each.
pub fn hello_then_sleep(ticks: u32, tick: Duration) -> Operation {
    Operation::new("hello_then_sleep", move |console, _| {
        console.println("Hello")?;
        for _ in 0..ticks {
            console.sleep(tick)?;
        }
        Ok(Value::Null)
    })
}

/// Reads two values and prints their concatenation.
pub fn greeter() -> Operation {
    Operation::new("greeter", |console, _| {
        let first = console.input("first: ")?;
        let last = console.input("last: ")?;
        console.println(format!("Hi {first} {last}"))?;
        Ok(json!(format!("{first} {last}")))
    })
}
