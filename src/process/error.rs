use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single supervised invocation.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The invocation was built with a zero timeout.
    #[error("invalid timeout for '{program}': timeout must be greater than zero")]
    InvalidTimeout { program: String },

    /// The process could not be started at all.
    #[error("cannot start process '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process ran and exited with a non-zero code.
    #[error("'{program}' failed with exit code {code}")]
    NonZeroExit { program: String, code: i32 },

    /// The process ended without an exit code (killed by a signal).
    #[error("'{program}' was terminated before it could exit")]
    Terminated { program: String },

    /// The watchdog fired and the process was killed.
    #[error("'{program}' timed out after {}s and was killed", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },

    /// Supervising the process failed (waiting, killing, reading output).
    #[error("failed to supervise '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Exit code reported by a process that started and exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProcessError::TimedOut { .. })
    }

    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, ProcessError::Spawn { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_exit_carries_code() {
        let err = ProcessError::NonZeroExit {
            program: "ffmpeg".to_string(),
            code: 183,
        };
        assert_eq!(err.exit_code(), Some(183));
        assert_eq!(err.to_string(), "'ffmpeg' failed with exit code 183");
    }

    #[test]
    fn timeout_is_distinct_from_exit_failure() {
        let err = ProcessError::TimedOut {
            program: "yt-dlp".to_string(),
            timeout: Duration::from_secs(300),
        };
        assert!(err.is_timeout());
        assert_eq!(err.exit_code(), None);
        assert_eq!(err.to_string(), "'yt-dlp' timed out after 300s and was killed");
    }

    #[test]
    fn spawn_failure_names_program() {
        let err = ProcessError::Spawn {
            program: "/nope/yt-dlp".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert!(err.is_spawn_failure());
        assert_eq!(err.exit_code(), None);
        assert!(err.to_string().starts_with("cannot start process '/nope/yt-dlp'"));
    }
}
