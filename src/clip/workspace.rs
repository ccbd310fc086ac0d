use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::config::ClipperConfig;

/// File layout of one run. Every external command runs with `dir` as its
/// working directory, and every intermediate file lives directly inside it.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
    stem: String,
    temp_video: String,
}

impl Workspace {
    pub fn new(dir: impl Into<PathBuf>, config: &ClipperConfig) -> Self {
        Self {
            dir: dir.into(),
            stem: config.output_stem.clone(),
            temp_video: config.temp_video.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Output template handed to the downloader; it appends `.<lang>.vtt`.
    pub fn subtitle_template(&self) -> PathBuf {
        self.dir.join(&self.stem)
    }

    pub fn vtt(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.vtt", self.stem, lang))
    }

    pub fn ass_file_name(&self, lang: &str) -> String {
        format!("{}.{}.ass", self.stem, lang)
    }

    pub fn ass(&self, lang: &str) -> PathBuf {
        self.dir.join(self.ass_file_name(lang))
    }

    /// Side file the converter writes before events are merged into the styled file.
    pub fn converted(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.converted.ass", self.stem, lang))
    }

    pub fn temp_video(&self) -> PathBuf {
        self.dir.join(&self.temp_video)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }
}

/// Delete `path` if it exists. Returns whether something was deleted.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
    }
}
