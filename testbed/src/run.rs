//! Runs every test of a loaded test file against a program.

use engine::io::config::EngineConfig;
use engine::io::status::StatusPrinter;
use engine::{Namespace, TestCase};
use tracing::{info, instrument, warn};

use crate::report::RunSummary;
use crate::test_file::{TestFile, TestSpec};

/// Knobs for a run that do not come from the test file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub engine: EngineConfig,
    pub status: StatusPrinter,
}

/// Run the tests in file order. A failing or unknown test never stops the run.
#[instrument(skip_all, fields(program = program.name(), tests = file.tests.len()))]
pub fn run_tests(program: &Namespace, file: &TestFile, options: &RunOptions) -> RunSummary {
    let mut summary = RunSummary {
        total: file.tests.len(),
        ..RunSummary::default()
    };
    for (index, spec) in file.tests.iter().enumerate() {
        let (name, passed) = run_one(program, spec, options);
        if passed {
            summary.passed += 1;
        } else {
            summary.failed.push(format!("Test {}: {name}", index + 1));
        }
    }
    info!(passed = summary.passed, total = summary.total, "run finished");
    summary
}

fn run_one(program: &Namespace, spec: &TestSpec, options: &RunOptions) -> (String, bool) {
    let Some(operation) = program.get(&spec.function) else {
        let name = spec
            .config
            .name
            .clone()
            .unwrap_or_else(|| spec.function.clone());
        warn!(function = %spec.function, "unknown function");
        if options.status.enabled {
            println!(
                "unknown function '{}' in program '{}'",
                spec.function,
                program.name()
            );
        }
        return (name, false);
    };

    let mut case = TestCase::new(operation.clone())
        .with_engine_config(&options.engine)
        .status(options.status)
        .set_args(spec.args.clone(), spec.kwdargs.clone())
        .configure(spec.config.clone());
    // The exception was already reported by the case.
    let _ = case.run();
    (case.case_name().to_string(), case.success())
}
