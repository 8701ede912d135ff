//! Deterministic, pure logic shared by the engine.
//!
//! Core modules are free of I/O and threads. They operate on captured text and
//! values and return deterministic outputs suitable for tests.

pub mod budget;
pub mod compare;
pub mod diff;
pub mod expect;
pub mod style;
pub mod types;
