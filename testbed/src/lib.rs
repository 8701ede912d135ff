//! Command-line test bed: runs a JSON test file against a named program.
//!
//! - [`test_file`]: loading and validating the test file.
//! - [`programs`]: the programs that can be tested.
//! - [`run`]: one [`engine::TestCase`] per test entry.
//! - [`report`]: banner and summary output.

pub mod programs;
pub mod report;
pub mod run;
pub mod test_file;
