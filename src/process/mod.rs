//! Supervised external process execution.
//!
//! Every external tool ytclip drives goes through this module:
//!
//! - stdout and stderr merged into one line stream
//! - noise lines (progress counters) filtered before they reach the console
//! - a watchdog timeout that kills the process
//! - distinct errors for "could not start", "exited non-zero" and "timed out"

mod error;
mod filter;
mod invocation;
mod runner;

pub use error::ProcessError;
pub use filter::{DEFAULT_NOISE_MARKERS, OutputFilter};
pub use invocation::Invocation;
pub use runner::{CommandRunner, ConsoleSink, LineSink, SystemRunner};
