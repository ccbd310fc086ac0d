use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::cli::{Cli, ClipArgs, Commands, ConfigCommands, DownloadArgs, SubsArgs, SubtitleArgs};
use crate::clip::{ClipRequest, ClipperConfig, FailurePolicy, Pipeline, PipelineReport, Workspace};
use crate::common::config::TomlConfig;
use crate::common::paths::default_config_path;
use crate::completions;
use crate::process::SystemRunner;
use crate::tools::check_tools;
use crate::ui::prelude::*;

/// Global options every command shares.
struct Globals {
    config_path: PathBuf,
    timeout: Option<u64>,
    dir: Option<PathBuf>,
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let ctx = Globals {
        config_path: match cli.config {
            Some(path) => path,
            None => default_config_path()?,
        },
        timeout: cli.timeout,
        dir: cli.dir,
    };

    match cli.command {
        Commands::Clip(args) => handle_clip(&ctx, args).await,
        Commands::Subs(args) => handle_subs(&ctx, args).await,
        Commands::Download(args) => handle_download(&ctx, args).await,
        Commands::Check => handle_check(&ctx).await,
        Commands::Config { command } => handle_config(&ctx, command),
        Commands::Completions { shell } => {
            print!("{}", completions::generate(shell)?);
            Ok(())
        }
    }
}

impl Globals {
    /// File values with command-line overrides applied on top.
    fn load_config(&self) -> Result<ClipperConfig> {
        let mut config = ClipperConfig::load_from_path(&self.config_path)?;
        if let Some(seconds) = self.timeout {
            config.timeout_seconds = seconds;
        }
        Ok(config)
    }

    fn workspace(&self, config: &ClipperConfig) -> Result<Workspace> {
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => env::current_dir().context("determining the current directory")?,
        };
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating working directory {}", dir.display()))?;
        // Child processes run inside this directory, so every path handed to them must be absolute
        let dir = fs::canonicalize(&dir)
            .with_context(|| format!("resolving working directory {}", dir.display()))?;
        Ok(Workspace::new(dir, config))
    }
}

fn apply_subtitle_args(config: &mut ClipperConfig, args: &SubtitleArgs) -> FailurePolicy {
    if !args.languages.is_empty() {
        config.languages = args.languages.clone();
    }
    if args.keep_going {
        FailurePolicy::ContinueOnFailure
    } else {
        FailurePolicy::HaltOnFirstFailure
    }
}

async fn handle_clip(ctx: &Globals, args: ClipArgs) -> Result<()> {
    let mut config = ctx.load_config()?;
    let policy = apply_subtitle_args(&mut config, &args.subtitles);
    if let Some(burn) = args.burn {
        config.burn_language = burn;
    }
    if args.keep_temp {
        config.keep_temp_video = true;
    }
    config.validate()?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(config.default_clip_name()));
    let request = ClipRequest::new(args.url, args.start, args.end, output)?;
    let workspace = ctx.workspace(&config)?;

    let report = Pipeline::new(&config, &SystemRunner, &workspace, policy)?
        .run_clip(&request)
        .await?;
    finish(&report)
}

async fn handle_subs(ctx: &Globals, args: SubsArgs) -> Result<()> {
    let mut config = ctx.load_config()?;
    let policy = apply_subtitle_args(&mut config, &args.subtitles);
    config.validate()?;
    let workspace = ctx.workspace(&config)?;

    let report = Pipeline::new(&config, &SystemRunner, &workspace, policy)?
        .run_subtitles(&args.url)
        .await?;
    finish(&report)
}

async fn handle_download(ctx: &Globals, args: DownloadArgs) -> Result<()> {
    let config = ctx.load_config()?;
    config.validate()?;
    if args.url.trim().is_empty() {
        bail!("video URL must not be empty");
    }
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&config.temp_video));
    let workspace = ctx.workspace(&config)?;

    let report = Pipeline::new(
        &config,
        &SystemRunner,
        &workspace,
        FailurePolicy::HaltOnFirstFailure,
    )?
    .run_download(&args.url, &output)
    .await?;

    emit(
        Level::Success,
        "download.success",
        &format!("Saved video to {}", workspace.resolve(&output).display()),
        None,
    );
    finish(&report)
}

/// Print the step summary; recorded failures make the command fail.
fn finish(report: &PipelineReport) -> Result<()> {
    separator();
    let data = serde_json::to_value(report).ok();
    emit(Level::Info, "clip.report", "Summary:", data);
    for line in report.summary_lines() {
        emit(Level::Info, "clip.report.step", &line, None);
    }

    if report.has_failures() {
        bail!("{} step(s) failed", report.failures().count());
    }
    emit(Level::Success, "clip.done", "All steps finished", None);
    Ok(())
}

async fn handle_check(ctx: &Globals) -> Result<()> {
    let config = ctx.load_config()?;
    config.validate()?;

    let statuses = check_tools(&config, &SystemRunner).await;
    for status in &statuses {
        let data = serde_json::to_value(status).ok();
        match (&status.resolved, &status.problem) {
            (Some(path), None) => emit(
                Level::Success,
                "tools.ok",
                &format!(
                    "{}: {} ({})",
                    status.name,
                    path.display(),
                    status.version.as_deref().unwrap_or("unknown version")
                ),
                data,
            ),
            (_, problem) => emit(
                Level::Error,
                "tools.missing",
                &format!(
                    "{}: {}",
                    status.name,
                    problem.as_deref().unwrap_or("unavailable")
                ),
                data,
            ),
        }
    }

    if statuses.iter().any(|s| !s.is_ok()) {
        bail!("required tools are missing or broken");
    }
    Ok(())
}

fn handle_config(ctx: &Globals, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let config = ctx.load_config()?;
            config.validate()?;
            let data = serde_json::to_value(&config).ok();
            emit(
                Level::Info,
                "config.show",
                config.to_documented_toml()?.trim_end(),
                data,
            );
        }
        ConfigCommands::Path => {
            emit(
                Level::Info,
                "config.path",
                &ctx.config_path.display().to_string(),
                None,
            );
        }
        ConfigCommands::Init { force } => {
            ClipperConfig::default().save_to_path(&ctx.config_path, force)?;
            emit(
                Level::Success,
                "config.init",
                &format!("Wrote default configuration to {}", ctx.config_path.display()),
                None,
            );
        }
    }
    Ok(())
}
