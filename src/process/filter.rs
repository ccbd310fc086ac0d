/// Substring-based noise filter for child output.
///
/// A line is noise when it contains any of the markers. The default markers
/// match yt-dlp download progress (`ETA`) and ffmpeg encoder stats (`frame=`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFilter {
    markers: Vec<String>,
}

impl Default for OutputFilter {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_MARKERS.iter().copied())
    }
}

pub const DEFAULT_NOISE_MARKERS: &[&str] = &["ETA", "frame="];

impl OutputFilter {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.is_empty())
                .collect(),
        }
    }

    /// Filter that lets every line through.
    pub fn none() -> Self {
        Self {
            markers: Vec::new(),
        }
    }

    pub fn is_noise(&self, line: &str) -> bool {
        self.markers.iter().any(|m| line.contains(m.as_str()))
    }

    pub fn passes(&self, line: &str) -> bool {
        !self.is_noise(line)
    }
}
