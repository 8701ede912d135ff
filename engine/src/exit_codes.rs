//! Stable exit codes for test drivers.

/// Every test passed.
pub const OK: i32 = 0;
/// At least one test failed, raised unexpectedly, or timed out.
pub const FAILED: i32 = 1;
/// The test file or config could not be loaded or validated.
pub const INVALID: i32 = 2;
