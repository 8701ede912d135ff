//! Side-effecting parts of the engine: console capture, worker threads,
//! configuration files and status output.

pub mod cancel;
pub mod channel;
pub mod config;
pub mod console;
pub mod status;
pub mod supervisor;
