//! Reusable TOML configuration pattern
//!
//! Config structs derive `Serialize`/`Deserialize` with `#[serde(default)]` on
//! every table, so a partial file is always completed from the defaults. A
//! missing file is not an error: loading yields `Self::default()` and leaves the
//! filesystem untouched. Writing a file is an explicit operation.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// Trait for configs persisted as TOML
pub trait TomlConfig: Sized + Default + Serialize + DeserializeOwned {
    /// Human readable name used in error messages
    const NAME: &'static str;

    /// Comment block written above the serialized values
    fn header() -> &'static str {
        ""
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading {} from {}", Self::NAME, path.display()))?;
        Self::load_from_str(&contents)
            .with_context(|| format!("parsing {} at {}", Self::NAME, path.display()))
    }

    fn load_from_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        Ok(config)
    }

    /// Render the documented file contents
    fn to_documented_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self)
            .with_context(|| format!("serializing {}", Self::NAME))?;

        let mut output = String::new();
        for line in Self::header().lines() {
            if line.is_empty() {
                output.push_str("#\n");
            } else {
                output.push_str(&format!("# {}\n", line));
            }
        }
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&body);
        Ok(output)
    }

    /// Write the documented config, refusing to clobber an existing file unless `force`
    fn save_to_path(&self, path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            bail!(
                "{} already exists at {} (use --force to overwrite)",
                Self::NAME,
                path.display()
            );
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }

        let contents = self.to_documented_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("writing {} to {}", Self::NAME, path.display()))?;
        Ok(())
    }
}
