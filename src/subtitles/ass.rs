//! ASS (Advanced SubStation Alpha) file generation.
//!
//! ffmpeg converts WebVTT to ASS with its own built-in style. We write our
//! styled header first, let ffmpeg convert into a side file, and then move the
//! converted `Dialogue:` events under our header so they pick up our style.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::style::AssStyle;

const STYLE_FORMAT: &str = "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding";
const EVENT_FORMAT: &str =
    "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text";

/// Render the fixed header: script info, the single style record, the events section.
pub fn render_header(style: &AssStyle) -> String {
    format!(
        "[Script Info]\n\
         ScriptType: v4.00+\n\
         PlayResX: {}\n\
         PlayResY: {}\n\
         WrapStyle: 0\n\
         \n\
         [V4+ Styles]\n\
         {}\n\
         {}\n\
         \n\
         [Events]\n\
         {}\n",
        style.play_res.0,
        style.play_res.1,
        STYLE_FORMAT,
        style.to_style_line(),
        EVENT_FORMAT,
    )
}

/// Write a fresh styled file at `path`, replacing whatever was there.
pub fn write_styled_header(path: &Path, style: &AssStyle) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("removing stale subtitle file {}", path.display()))?;
    }
    fs::write(path, render_header(style))
        .with_context(|| format!("writing subtitle header to {}", path.display()))
}

/// Append the dialogue events of `converted` to the styled file at `styled_path`.
///
/// Returns the number of events appended.
pub fn merge_dialogue(styled_path: &Path, converted: &str, style_name: &str) -> Result<usize> {
    let mut content = fs::read_to_string(styled_path)
        .with_context(|| format!("reading styled subtitle file {}", styled_path.display()))?;
    if !content.ends_with('\n') {
        content.push('\n');
    }

    let mut count = 0;
    for line in converted.lines() {
        if let Some(event) = restyle_dialogue(line, style_name) {
            content.push_str(&event);
            content.push('\n');
            count += 1;
        }
    }

    fs::write(styled_path, content)
        .with_context(|| format!("writing subtitle events to {}", styled_path.display()))?;
    Ok(count)
}

/// Rewrite the Style field of a `Dialogue:` line; `None` for any other line.
fn restyle_dialogue(line: &str, style_name: &str) -> Option<String> {
    let line = line.trim_start_matches('\u{feff}').trim_end_matches('\r');
    let body = line.strip_prefix("Dialogue:")?;

    // Layer, Start, End, Style, then the rest (Text may contain commas)
    let mut fields: Vec<&str> = body.splitn(5, ',').collect();
    if fields.len() < 5 {
        return None;
    }
    fields[3] = style_name;
    Some(format!("Dialogue:{}", fields.join(",")))
}
