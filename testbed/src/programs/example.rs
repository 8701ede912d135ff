//! Small console program used by the demo test file and the CLI tests.

use std::time::Duration;

use engine::core::expect::plain;
use engine::{Args, Console, Namespace, OperationError};
use serde_json::{Value, json};

const LONG_FUNCTION_TICKS: u32 = 20;

pub fn namespace() -> Namespace {
    Namespace::new("example")
        .with("empty", empty)
        .with("main", main)
        .with("long_function", long_function)
        .with("throw_error", throw_error)
}

/// No input, one line of output.
fn empty(console: &Console, _args: &Args) -> anyhow::Result<Value> {
    console.println("Empty function works.")?;
    Ok(Value::Null)
}

/// Reads five values and echoes each.
fn main(console: &Console, _args: &Args) -> anyhow::Result<Value> {
    for _ in 0..5 {
        let value = console.input("> ")?;
        console.println(format!("Testing: {value}"))?;
    }
    Ok(Value::Null)
}

/// Prints once a second for twenty seconds.
fn long_function(console: &Console, args: &Args) -> anyhow::Result<Value> {
    let line = match args.param(0, "some_input") {
        None | Some(Value::Null) => "Tick".to_string(),
        Some(value) => plain(value),
    };
    for _ in 0..LONG_FUNCTION_TICKS {
        console.println(&line)?;
        console.sleep(Duration::from_secs(1))?;
    }
    Ok(json!(["string", 1, true]))
}

fn throw_error(_console: &Console, args: &Args) -> anyhow::Result<Value> {
    let text = args
        .str_param(0, "error_text")?
        .ok_or_else(|| OperationError::new("TypeError", "missing argument error_text"))?;
    Err(OperationError::new("RuntimeError", text).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::test_support::quiet_case;
    use engine::{Operation, TimeBudget};

    fn operation(name: &str) -> Operation {
        namespace().get(name).expect("registered").clone()
    }

    #[test]
    fn main_echoes_five_inputs() {
        let mut case = quiet_case(operation("main"))
            .user_input(["1", "2", "3", "4", "5"])
            .flags(engine::EchoFlags {
                capture_input: false,
                ..engine::EchoFlags::silent()
            })
            .expect_out("Testing: 1\nTesting: 2\nTesting: 3\nTesting: 4\nTesting: 5\n");
        case.run().expect("run");
        assert!(case.success(), "{}", case.diff());
    }

    #[test]
    fn throw_error_raises_runtime_error() {
        let mut case = quiet_case(operation("throw_error"))
            .timeout(TimeBudget::Unlimited)
            .set_args(vec![json!("boom")], serde_json::Map::new());
        let err = case.run().expect_err("raises");
        assert_eq!(err.kind, "RuntimeError");
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn throw_error_without_text_is_a_type_error() {
        let mut case = quiet_case(operation("throw_error")).timeout(TimeBudget::Unlimited);
        let err = case.run().expect_err("raises");
        assert_eq!(err.kind, "TypeError");
    }
}
