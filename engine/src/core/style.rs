//! Terminal escape sequences embedded in captured echoes and diff reports.
//!
//! These are part of the rendered text (the diff report is a plain string), so
//! they are fixed sequences rather than terminal-dependent styles.

pub const RESET: &str = "\x1b[0m";
pub const UNDERLINE: &str = "\x1b[4m";
pub const YELLOW: &str = "\x1b[93m";
pub const DARK_CYAN: &str = "\x1b[36m";
pub const DARK_MAGENTA: &str = "\x1b[35m";

/// Marks the start of a divergent region in a diff report.
pub const HIGHLIGHT: &str = "\x1b[91m\x1b[4m";
