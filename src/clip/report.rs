use std::fmt;

use serde::Serialize;

/// What happens when a step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failed step and return its error.
    #[default]
    HaltOnFirstFailure,
    /// Record the failure and keep going; steps whose inputs are missing are skipped.
    ContinueOnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    FetchSubtitles,
    ConvertSubtitles { language: String },
    DownloadVideo,
    Clip,
    Cleanup,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::FetchSubtitles => write!(f, "fetch subtitles"),
            Step::ConvertSubtitles { language } => write!(f, "convert {} subtitles", language),
            Step::DownloadVideo => write!(f, "download video"),
            Step::Clip => write!(f, "clip video"),
            Step::Cleanup => write!(f, "clean up"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    #[serde(flatten)]
    pub step: Step,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub steps: Vec<StepRecord>,
}

impl PipelineReport {
    pub fn record(&mut self, step: Step, outcome: StepOutcome) {
        self.steps.push(StepRecord { step, outcome });
    }

    pub fn outcome_of(&self, step: &Step) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|r| &r.step == step)
            .map(|r| &r.outcome)
    }

    pub fn completed(&self, step: &Step) -> bool {
        matches!(self.outcome_of(step), Some(StepOutcome::Completed))
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn summary_lines(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|r| match &r.outcome {
                StepOutcome::Completed => format!("  done     {}", r.step),
                StepOutcome::Skipped(why) => format!("  skipped  {} ({})", r.step, why),
                StepOutcome::Failed(err) => format!("  FAILED   {}: {}", r.step, err),
            })
            .collect()
    }
}
