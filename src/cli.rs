use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueHint};

use crate::clip::ClipTime;
use crate::completions::SupportedShell;
use crate::ui::OutputFormat;

/// Clip YouTube videos with styled, burned-in subtitles
#[derive(Parser, Debug)]
#[command(name = "ytclip", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to <config dir>/ytclip/config.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Override the per-command timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Directory for downloads, subtitle files and the clip
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Activate debug mode (prints every command line)
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Output format for events
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Download, trim and subtitle a clip
    Clip(ClipArgs),
    /// Fetch subtitles and convert them to styled ASS files
    Subs(SubsArgs),
    /// Download the full video without clipping
    Download(DownloadArgs),
    /// Check that yt-dlp and ffmpeg can be found and run
    Check,
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: SupportedShell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ClipArgs {
    /// Video URL
    pub url: String,

    /// Clip start (HH:MM:SS[.fff])
    #[arg(short, long)]
    pub start: ClipTime,

    /// Clip end (HH:MM:SS[.fff])
    #[arg(short, long)]
    pub end: ClipTime,

    /// Output file; defaults to <output_stem>.mp4 in the working directory
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Subtitle language to burn in (overrides burn_language)
    #[arg(long, value_name = "LANG")]
    pub burn: Option<String>,

    #[command(flatten)]
    pub subtitles: SubtitleArgs,

    /// Keep the full-length download after clipping
    #[arg(long)]
    pub keep_temp: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SubsArgs {
    /// Video URL
    pub url: String,

    #[command(flatten)]
    pub subtitles: SubtitleArgs,
}

#[derive(Args, Debug, Clone)]
pub struct SubtitleArgs {
    /// Subtitle languages to fetch (comma separated, overrides languages)
    #[arg(short, long, value_delimiter = ',', value_name = "LANGS")]
    pub languages: Vec<String>,

    /// Record failed steps and carry on instead of stopping
    #[arg(short, long)]
    pub keep_going: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Video URL
    pub url: String,

    /// Output file; defaults to temp_video in the working directory
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn cli_command() -> clap::Command {
    Cli::command()
}
