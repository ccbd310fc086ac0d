//! Argument lists for yt-dlp and ffmpeg.

use std::path::Path;

use super::config::ClipperConfig;
use super::request::ClipRequest;
use super::workspace::Workspace;
use crate::process::Invocation;

fn base(config: &ClipperConfig, program: &Path, workspace: &Workspace) -> Invocation {
    Invocation::new(program, config.timeout())
        .filter(config.output_filter())
        .current_dir(workspace.dir())
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Download subtitles (manual and automatic) without the video.
pub fn fetch_subtitles(config: &ClipperConfig, workspace: &Workspace, url: &str) -> Invocation {
    base(config, &config.tools.yt_dlp, workspace)
        .args(["--write-subs", "--write-auto-subs"])
        .arg("--sub-lang")
        .arg(config.languages.join(","))
        .arg("--skip-download")
        .arg("--socket-timeout")
        .arg(config.download.socket_timeout.to_string())
        .arg("--retries")
        .arg(config.download.retries.to_string())
        .arg("-o")
        .arg(path_arg(&workspace.subtitle_template()))
        .arg(url)
}

/// Convert one WebVTT track into ffmpeg's ASS output.
pub fn convert_subtitle(
    config: &ClipperConfig,
    workspace: &Workspace,
    vtt: &Path,
    converted: &Path,
) -> Invocation {
    base(config, &config.tools.ffmpeg, workspace)
        .args(["-y", "-i"])
        .arg(path_arg(vtt))
        .args(["-f", "ass"])
        .arg(path_arg(converted))
}

/// yt-dlp format selector: best video+audio up to `max_height`.
pub fn format_selector(max_height: u32) -> String {
    format!(
        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
        h = max_height
    )
}

/// Download the full video merged into an mp4 at `dest`.
pub fn download_video(
    config: &ClipperConfig,
    workspace: &Workspace,
    url: &str,
    dest: &Path,
) -> Invocation {
    base(config, &config.tools.yt_dlp, workspace)
        .arg("-f")
        .arg(format_selector(config.download.max_height))
        .args(["--merge-output-format", "mp4"])
        .arg("--retries")
        .arg(config.download.retries.to_string())
        .arg("--socket-timeout")
        .arg(config.download.socket_timeout.to_string())
        .arg("--no-check-certificates")
        .arg("-o")
        .arg(path_arg(dest))
        .arg(url)
}

/// Trim `input` to the requested window, optionally burning in an ASS file.
///
/// `subtitle_file` is a file name relative to the workspace; the process runs
/// inside the workspace so the filter argument never contains a drive letter
/// or directory separators that would need filtergraph escaping.
pub fn clip_video(
    config: &ClipperConfig,
    workspace: &Workspace,
    request: &ClipRequest,
    input: &Path,
    subtitle_file: Option<&str>,
    output: &Path,
) -> Invocation {
    let encoding = &config.encoding;
    let mut invocation = base(config, &config.tools.ffmpeg, workspace)
        .arg("-y")
        .arg("-ss")
        .arg(request.start.to_string())
        .arg("-to")
        .arg(request.end.to_string())
        .arg("-i")
        .arg(path_arg(input));

    if let Some(file) = subtitle_file {
        invocation = invocation.arg("-vf").arg(ass_filter(file));
    }

    invocation
        .arg("-c:v")
        .arg(encoding.video_codec.as_str())
        .arg("-preset")
        .arg(encoding.preset.as_str())
        .arg("-crf")
        .arg(encoding.crf.to_string())
        .arg("-c:a")
        .arg(encoding.audio_codec.as_str())
        .arg("-b:a")
        .arg(encoding.audio_bitrate.as_str())
        .arg(path_arg(output))
}

/// `ass=<file>` with the file name quoted when it contains filtergraph syntax.
pub fn ass_filter(file_name: &str) -> String {
    let plain = file_name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | '_'));
    if plain {
        format!("ass={}", file_name)
    } else {
        // Inside single quotes only the quote itself needs escaping
        format!("ass='{}'", file_name.replace('\'', r"'\''"))
    }
}
