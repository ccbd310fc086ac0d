//! Shell utility functions
//!
//! Rendering of argument vectors for log output. Nothing in this crate runs a
//! shell; commands are always spawned with an explicit argv.

use std::path::Path;

/// Render a program and its arguments as a copy-pasteable shell command line.
pub fn format_command_line(program: &Path, args: &[String]) -> String {
    let program = program.to_string_lossy();
    let mut parts: Vec<&str> = Vec::with_capacity(args.len() + 1);
    parts.push(&program);
    parts.extend(args.iter().map(String::as_str));
    shell_words::join(parts)
}
