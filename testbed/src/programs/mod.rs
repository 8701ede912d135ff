//! Programs available to the test bed, keyed by name.

mod example;

use engine::Namespace;

/// Names accepted on the command line.
pub const PROGRAMS: &[&str] = &["example"];

/// Build the namespace for a program name.
pub fn lookup(name: &str) -> Option<Namespace> {
    match name {
        "example" => Some(example::namespace()),
        _ => None,
    }
}
