use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::NaiveTime;

/// A position in the source video, `HH:MM:SS[.fff]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClipTime(NaiveTime);

impl ClipTime {
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M:%S%.f")
            .map(Self)
            .with_context(|| format!("'{}' is not a timestamp in HH:MM:SS[.fff] form", value))
    }
}

impl FromStr for ClipTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ClipTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S%.3f"))
    }
}

/// What the user asked `clip` to produce.
#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub url: String,
    pub start: ClipTime,
    pub end: ClipTime,
    /// Relative paths are resolved against the working directory
    pub output: PathBuf,
}

impl ClipRequest {
    pub fn new(
        url: impl Into<String>,
        start: ClipTime,
        end: ClipTime,
        output: impl Into<PathBuf>,
    ) -> Result<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            bail!("video URL must not be empty");
        }
        if end <= start {
            bail!("clip end ({}) must be after clip start ({})", end, start);
        }
        Ok(Self {
            url,
            start,
            end,
            output: output.into(),
        })
    }
}
