//! `testbed` binary: run a test file against a program and exit with its verdict.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use engine::exit_codes;
use engine::io::config::{EngineConfig, load_config};
use engine::io::status::StatusPrinter;
use testbed::programs::{self, PROGRAMS};
use testbed::report::{self, RunSummary};
use testbed::run::{RunOptions, run_tests};
use testbed::test_file::load_test_file;

#[derive(Parser)]
#[command(
    name = "testbed",
    version,
    about = "Run a JSON test file against a console program"
)]
struct Cli {
    /// Program under test.
    program: String,

    /// JSON test file.
    #[arg(short, long, value_name = "FILE")]
    testfile: PathBuf,

    /// Engine defaults (TOML). Built-in defaults when omitted or missing.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() {
    engine::logging::init();
    let cli = Cli::parse();
    let code = match run(&cli) {
        Ok(summary) => summary.exit_code(),
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run(cli: &Cli) -> Result<RunSummary> {
    let file = load_test_file(&cli.testfile)?;
    let program = programs::lookup(&cli.program).ok_or_else(|| {
        anyhow!(
            "unknown program '{}' (available: {})",
            cli.program,
            PROGRAMS.join(", ")
        )
    })?;
    let engine = match &cli.config {
        Some(path) => load_config(path).context("load engine config")?,
        None => EngineConfig::default(),
    };

    let options = RunOptions {
        engine,
        status: StatusPrinter::default(),
    };
    print!(
        "{}",
        report::banner(&options.status.styles, &display_name(&cli.testfile), program.name())
    );
    let summary = run_tests(&program, &file, &options);
    print!("{}", report::summary(&options.status.styles, &summary));
    Ok(summary)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
