use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::config::ClipperConfig;
use super::report::{FailurePolicy, PipelineReport, Step, StepOutcome};
use super::request::ClipRequest;
use super::steps;
use super::workspace::{Workspace, remove_if_exists};
use crate::process::{CommandRunner, ConsoleSink, Invocation, ProcessError};
use crate::subtitles::{AssStyle, DEFAULT_STYLE_NAME, merge_dialogue, write_styled_header};
use crate::ui::prelude::*;

/// One run of the clipper. Steps execute sequentially; the policy decides
/// what a failed step does to the rest of the run.
pub struct Pipeline<'a> {
    config: &'a ClipperConfig,
    runner: &'a dyn CommandRunner,
    workspace: &'a Workspace,
    policy: FailurePolicy,
    style: AssStyle,
    report: PipelineReport,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a ClipperConfig,
        runner: &'a dyn CommandRunner,
        workspace: &'a Workspace,
        policy: FailurePolicy,
    ) -> Result<Self> {
        let style = AssStyle::from_options(&config.style)?;
        Ok(Self {
            config,
            runner,
            workspace,
            policy,
            style,
            report: PipelineReport::default(),
        })
    }

    /// Subtitles, full download, trimmed clip with burned subtitles, cleanup.
    pub async fn run_clip(mut self, request: &ClipRequest) -> Result<PipelineReport> {
        self.subtitle_steps(&request.url).await?;

        let temp_video = self.workspace.temp_video();
        let downloaded = self.download_video(&request.url, &temp_video).await;
        self.settle(Step::DownloadVideo, downloaded)?;

        if self.report.completed(&Step::DownloadVideo) {
            let clipped = self.clip_video(request, &temp_video).await;
            self.settle(Step::Clip, clipped)?;
        } else {
            self.report.record(
                Step::Clip,
                StepOutcome::Skipped("video download failed".to_string()),
            );
        }

        let cleaned = self.cleanup(&temp_video);
        self.settle(Step::Cleanup, cleaned)?;

        Ok(self.report)
    }

    /// Fetch and convert subtitles only.
    pub async fn run_subtitles(mut self, url: &str) -> Result<PipelineReport> {
        self.subtitle_steps(url).await?;
        Ok(self.report)
    }

    /// Download the full video straight to `output`.
    pub async fn run_download(mut self, url: &str, output: &Path) -> Result<PipelineReport> {
        let dest = self.workspace.resolve(output);
        let downloaded = self.download_video(url, &dest).await;
        self.settle(Step::DownloadVideo, downloaded)?;
        Ok(self.report)
    }

    async fn subtitle_steps(&mut self, url: &str) -> Result<()> {
        let fetched = self.fetch_subtitles(url).await;
        self.settle(Step::FetchSubtitles, fetched)?;

        let config = self.config;
        for language in &config.languages {
            let converted = self.convert_subtitles(language).await;
            self.settle(
                Step::ConvertSubtitles {
                    language: language.clone(),
                },
                converted,
            )?;
        }
        Ok(())
    }

    /// Record the outcome of a step, or stop the run when halting on failure.
    fn settle(&mut self, step: Step, result: Result<StepOutcome>) -> Result<()> {
        match result {
            Ok(outcome) => {
                if let StepOutcome::Skipped(reason) = &outcome {
                    emit(
                        Level::Warn,
                        "clip.step.skipped",
                        &format!("Skipped {}: {}", step, reason),
                        None,
                    );
                }
                self.report.record(step, outcome);
                Ok(())
            }
            Err(err) => match self.policy {
                FailurePolicy::HaltOnFirstFailure => {
                    Err(err.context(format!("step '{}' failed", step)))
                }
                FailurePolicy::ContinueOnFailure => {
                    let exit_code = err
                        .downcast_ref::<ProcessError>()
                        .and_then(ProcessError::exit_code);
                    emit(
                        Level::Error,
                        "clip.step.failed",
                        &format!("{} failed: {:#}", step, err),
                        exit_code.map(|code| serde_json::json!({ "exit_code": code })),
                    );
                    self.report
                        .record(step, StepOutcome::Failed(format!("{:#}", err)));
                    Ok(())
                }
            },
        }
    }

    async fn execute(&self, invocation: &Invocation) -> Result<()> {
        let mut sink = ConsoleSink;
        if let Err(err) = self.runner.run(invocation, &mut sink).await {
            let hint = if err.is_timeout() {
                Some("Raise timeout_seconds or pass --timeout for slow connections")
            } else if err.is_spawn_failure() {
                Some("Run `ytclip check` to verify the configured tool paths")
            } else {
                None
            };
            if let Some(hint) = hint {
                emit(Level::Info, "process.hint", hint, None);
            }
            return Err(err.into());
        }
        Ok(())
    }

    async fn fetch_subtitles(&self, url: &str) -> Result<StepOutcome> {
        emit(
            Level::Info,
            "clip.subtitles.fetch",
            &format!("Fetching subtitles ({})", self.config.languages.join(", ")),
            None,
        );
        self.execute(&steps::fetch_subtitles(self.config, self.workspace, url))
            .await?;
        Ok(StepOutcome::Completed)
    }

    async fn convert_subtitles(&self, language: &str) -> Result<StepOutcome> {
        let vtt = self.workspace.vtt(language);
        let ass = self.workspace.ass(language);
        if !vtt.exists() {
            // An .ass left by an earlier run belongs to some other video
            remove_if_exists(&ass)?;
            return Ok(StepOutcome::Skipped(format!(
                "no {} subtitles were downloaded",
                language
            )));
        }

        let converted = self.workspace.converted(language);
        let count = match self.write_styled_subtitles(&vtt, &ass, &converted).await {
            Ok(count) => count,
            Err(err) => {
                // A header-only file would later be burned in as empty subtitles
                remove_if_exists(&ass)?;
                remove_if_exists(&converted)?;
                return Err(err);
            }
        };

        remove_if_exists(&converted)?;
        remove_if_exists(&vtt)?;

        emit(
            Level::Info,
            "clip.subtitles.converted",
            &format!("Wrote {} ({} events)", ass.display(), count),
            None,
        );
        Ok(StepOutcome::Completed)
    }

    async fn write_styled_subtitles(
        &self,
        vtt: &Path,
        ass: &Path,
        converted: &Path,
    ) -> Result<usize> {
        write_styled_header(ass, &self.style)?;
        remove_if_exists(converted)?;

        self.execute(&steps::convert_subtitle(
            self.config,
            self.workspace,
            vtt,
            converted,
        ))
        .await?;

        let events = fs::read_to_string(converted)
            .with_context(|| format!("reading converted subtitles {}", converted.display()))?;
        merge_dialogue(ass, &events, DEFAULT_STYLE_NAME)
    }

    async fn download_video(&self, url: &str, dest: &Path) -> Result<StepOutcome> {
        emit(
            Level::Info,
            "clip.download.start",
            &format!(
                "Downloading video (up to {}p)",
                self.config.download.max_height
            ),
            None,
        );
        // yt-dlp skips the download when the destination already exists
        remove_if_exists(dest)?;
        self.execute(&steps::download_video(
            self.config,
            self.workspace,
            url,
            dest,
        ))
        .await?;

        if !dest.exists() {
            bail!(
                "downloader finished but {} was not created",
                dest.display()
            );
        }
        Ok(StepOutcome::Completed)
    }

    async fn clip_video(&self, request: &ClipRequest, input: &Path) -> Result<StepOutcome> {
        let output = self.workspace.resolve(&request.output);
        remove_if_exists(&output)?;

        let burn = &self.config.burn_language;
        let subtitle_file = if self.workspace.ass(burn).exists() {
            Some(self.workspace.ass_file_name(burn))
        } else {
            emit(
                Level::Warn,
                "clip.subtitles.missing",
                &format!(
                    "No {} subtitles available; clipping without burned-in subtitles",
                    burn
                ),
                None,
            );
            None
        };

        emit(
            Level::Info,
            "clip.encode.start",
            &format!("Clipping {} to {}", request.start, request.end),
            None,
        );
        self.execute(&steps::clip_video(
            self.config,
            self.workspace,
            request,
            input,
            subtitle_file.as_deref(),
            &output,
        ))
        .await?;

        emit(
            Level::Success,
            "clip.encode.success",
            &format!("Saved clip to {}", output.display()),
            None,
        );
        Ok(StepOutcome::Completed)
    }

    fn cleanup(&self, temp_video: &Path) -> Result<StepOutcome> {
        if self.config.keep_temp_video {
            return Ok(StepOutcome::Skipped(format!(
                "keeping {}",
                temp_video.display()
            )));
        }
        if remove_if_exists(temp_video)? {
            Ok(StepOutcome::Completed)
        } else {
            Ok(StepOutcome::Skipped("no temporary video to remove".to_string()))
        }
    }
}
