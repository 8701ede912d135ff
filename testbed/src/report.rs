//! Run banner and final summary.

use engine::io::status::Styles;
use owo_colors::OwoColorize;

const WIDTH: usize = 80;

/// Totals for one test file run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    /// `Test {n}: {name}` for every test that did not pass.
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            engine::exit_codes::OK
        } else {
            engine::exit_codes::FAILED
        }
    }
}

/// Header printed before the first test.
pub fn banner(styles: &Styles, test_file: &str, program: &str) -> String {
    let pad = "=".repeat((WIDTH.saturating_sub(program.len()) / 2).saturating_sub(1));
    let text = format!("Running tests in {test_file} ...\n{pad} {program} {pad}\n");
    text.style(styles.banner).to_string()
}

/// Footer with the pass count and the failed test list.
pub fn summary(styles: &Styles, summary: &RunSummary) -> String {
    let pad = "=".repeat((WIDTH / 2).saturating_sub(5));
    let mut out = format!("\n{}\n", format!("{pad} Finished {pad}").style(styles.banner));
    let counts = format!("{}/{} Tests Passed", summary.passed, summary.total);
    if summary.all_passed() {
        out.push_str(&counts.style(styles.pass).to_string());
    } else {
        out.push_str(&counts.style(styles.banner).to_string());
    }
    out.push('\n');
    if !summary.failed.is_empty() {
        out.push_str("Failed tests:\n");
        for failed in &summary.failed {
            out.push_str(&format!("\t{}\n", failed.style(styles.fail)));
        }
    }
    out
}
