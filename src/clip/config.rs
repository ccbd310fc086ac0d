use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::common::config::TomlConfig;
use crate::process::{DEFAULT_NOISE_MARKERS, OutputFilter};
use crate::subtitles::SubtitleStyle;

/// Everything that used to be a hard-coded constant: tool locations, the
/// watchdog timeout, downloader/encoder flags and subtitle appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipperConfig {
    /// Watchdog timeout applied to every external command
    pub timeout_seconds: u64,
    /// Output lines containing any of these are not echoed
    pub noise_markers: Vec<String>,
    /// Subtitle languages to fetch and convert, in order
    pub languages: Vec<String>,
    /// Language whose subtitles are burned into the clip
    pub burn_language: String,
    /// Base name for subtitle files (<stem>.<lang>.ass) and the default clip name
    pub output_stem: String,
    /// File name of the full-length download
    pub temp_video: String,
    pub keep_temp_video: bool,
    pub tools: ToolsConfig,
    pub download: DownloadConfig,
    pub encoding: EncodingConfig,
    pub style: SubtitleStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Name on PATH or absolute path
    pub yt_dlp: PathBuf,
    /// Name on PATH or absolute path
    pub ffmpeg: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub socket_timeout: u32,
    pub retries: u32,
    pub max_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for ClipperConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
            noise_markers: DEFAULT_NOISE_MARKERS.iter().map(|m| m.to_string()).collect(),
            languages: vec![
                "en".to_string(),
                "zh-Hans".to_string(),
                "zh-Hant".to_string(),
            ],
            burn_language: "zh-Hans".to_string(),
            output_stem: "Result".to_string(),
            temp_video: "temp.mp4".to_string(),
            keep_temp_video: false,
            tools: ToolsConfig::default(),
            download: DownloadConfig::default(),
            encoding: EncodingConfig::default(),
            style: SubtitleStyle::default(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            socket_timeout: 30,
            retries: 5,
            max_height: 1080,
        }
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
        }
    }
}

impl TomlConfig for ClipperConfig {
    const NAME: &'static str = "ytclip config";

    fn header() -> &'static str {
        "ytclip configuration\n\
         \n\
         Every key is optional; missing keys use the values shown here.\n\
         style.alignment: left, center, right, middle-left, middle, middle-right,\n\
         top-left, top, top-right. Colors: a name (white, black, ...) or #RRGGBB."
    }
}

impl ClipperConfig {
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn output_filter(&self) -> OutputFilter {
        OutputFilter::new(self.noise_markers.iter().cloned())
    }

    pub fn default_clip_name(&self) -> String {
        format!("{}.mp4", self.output_stem)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            bail!("timeout_seconds must be greater than zero");
        }
        if self.tools.yt_dlp.as_os_str().is_empty() {
            bail!("tools.yt_dlp must not be empty");
        }
        if self.tools.ffmpeg.as_os_str().is_empty() {
            bail!("tools.ffmpeg must not be empty");
        }
        if self.languages.is_empty() {
            bail!("languages must list at least one subtitle language");
        }
        for lang in &self.languages {
            if lang.trim().is_empty() || lang.contains(',') || lang.contains('/') {
                bail!("invalid subtitle language '{}'", lang);
            }
        }
        if self.burn_language.trim().is_empty() {
            bail!("burn_language must not be empty");
        }
        if self.output_stem.trim().is_empty() || self.output_stem.contains(['/', '\\']) {
            bail!("output_stem must be a plain file name, got '{}'", self.output_stem);
        }
        if self.temp_video.trim().is_empty() || self.temp_video.contains(['/', '\\']) {
            bail!("temp_video must be a plain file name, got '{}'", self.temp_video);
        }
        if self.download.max_height == 0 {
            bail!("download.max_height must be greater than zero");
        }
        if self.encoding.crf > 51 {
            bail!("encoding.crf must be between 0 and 51, got {}", self.encoding.crf);
        }
        self.style.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_the_classic_setup() {
        let config = ClipperConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.languages, vec!["en", "zh-Hans", "zh-Hant"]);
        assert_eq!(config.burn_language, "zh-Hans");
        assert_eq!(config.default_clip_name(), "Result.mp4");
        assert_eq!(config.encoding.crf, 23);
        assert!(config.output_filter().is_noise("frame=  12"));
        config.validate().unwrap();
    }

    #[test]
    fn nested_tables_are_partially_overridable() {
        let config = ClipperConfig::load_from_str(
            "timeout_seconds = 60\n\
             languages = [\"ja\"]\n\
             [tools]\n\
             ffmpeg = \"/opt/homebrew/bin/ffmpeg\"\n\
             [style]\n\
             font_size = 40\n",
        )
        .unwrap();

        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.languages, vec!["ja"]);
        assert_eq!(config.tools.ffmpeg, PathBuf::from("/opt/homebrew/bin/ffmpeg"));
        assert_eq!(config.tools.yt_dlp, PathBuf::from("yt-dlp"));
        assert_eq!(config.style.font_size, 40);
        assert_eq!(config.style.font_name, "PingFang SC");
        assert_eq!(config.download.retries, 5);
    }

    #[test]
    fn documented_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = ClipperConfig::default();
        config.keep_temp_video = true;
        config.style.alignment = "top".to_string();

        config.save_to_path(&path, false).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# ytclip configuration\n"));
        assert!(contents.contains("[style]"));
        assert_eq!(ClipperConfig::load_from_path(&path).unwrap(), config);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let cases: [(&str, fn(&mut ClipperConfig)); 8] = [
            ("timeout_seconds", |c: &mut ClipperConfig| c.timeout_seconds = 0),
            ("languages", |c: &mut ClipperConfig| c.languages.clear()),
            ("invalid subtitle language", |c: &mut ClipperConfig| {
                c.languages = vec!["en,fr".to_string()]
            }),
            ("output_stem", |c: &mut ClipperConfig| c.output_stem = "a/b".to_string()),
            ("temp_video", |c: &mut ClipperConfig| c.temp_video = String::new()),
            ("tools.ffmpeg", |c: &mut ClipperConfig| c.tools.ffmpeg = PathBuf::new()),
            ("encoding.crf", |c: &mut ClipperConfig| c.encoding.crf = 52),
            ("style.background_opacity", |c: &mut ClipperConfig| {
                c.style.background_opacity = 200
            }),
        ];

        for (needle, mutate) in cases {
            let mut config = ClipperConfig::default();
            mutate(&mut config);
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains(needle),
                "expected '{}' in '{}'",
                needle,
                err
            );
        }
    }
}
