use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::clip::ClipperConfig;
use crate::process::{CommandRunner, Invocation, LineSink, OutputFilter};

const VERSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of looking for one external tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub name: &'static str,
    pub configured: PathBuf,
    pub resolved: Option<PathBuf>,
    pub version: Option<String>,
    pub problem: Option<String>,
}

impl ToolStatus {
    pub fn is_ok(&self) -> bool {
        self.resolved.is_some() && self.problem.is_none()
    }
}

/// Locate yt-dlp and ffmpeg and ask each for its version.
pub async fn check_tools(config: &ClipperConfig, runner: &dyn CommandRunner) -> Vec<ToolStatus> {
    vec![
        check_tool("yt-dlp", &config.tools.yt_dlp, "--version", runner).await,
        check_tool("ffmpeg", &config.tools.ffmpeg, "-version", runner).await,
    ]
}

async fn check_tool(
    name: &'static str,
    configured: &Path,
    version_flag: &str,
    runner: &dyn CommandRunner,
) -> ToolStatus {
    let mut status = ToolStatus {
        name,
        configured: configured.to_path_buf(),
        resolved: None,
        version: None,
        problem: None,
    };

    let resolved = match which::which(configured) {
        Ok(path) => path,
        Err(err) => {
            status.problem = Some(format!("{} not found: {}", configured.display(), err));
            return status;
        }
    };

    let invocation = Invocation::new(&resolved, VERSION_TIMEOUT)
        .arg(version_flag)
        .filter(OutputFilter::none());
    let mut sink = FirstLine::default();
    if let Err(err) = runner.run(&invocation, &mut sink).await {
        status.problem = Some(err.to_string());
    }
    status.resolved = Some(resolved);
    status.version = sink.0;
    status
}

/// Keeps the first line of output, which is where both tools print their version.
#[derive(Default)]
struct FirstLine(Option<String>);

impl LineSink for FirstLine {
    fn line(&mut self, line: &str) {
        if self.0.is_none() {
            self.0 = Some(line.trim().to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessError;
    use async_trait::async_trait;

    struct VersionPrinter {
        fail: bool,
    }

    #[async_trait]
    impl CommandRunner for VersionPrinter {
        async fn run(
            &self,
            invocation: &Invocation,
            sink: &mut dyn LineSink,
        ) -> Result<(), ProcessError> {
            if self.fail {
                return Err(ProcessError::NonZeroExit {
                    program: invocation.program_name(),
                    code: 2,
                });
            }
            sink.line(&format!("{} version 7.0", invocation.arguments()[0]));
            sink.line("built with gcc");
            Ok(())
        }
    }

    fn config_with(yt_dlp: &str, ffmpeg: &str) -> ClipperConfig {
        let mut config = ClipperConfig::default();
        config.tools.yt_dlp = PathBuf::from(yt_dlp);
        config.tools.ffmpeg = PathBuf::from(ffmpeg);
        config
    }

    #[tokio::test]
    async fn reports_first_version_line() {
        let config = config_with("/bin/sh", "/bin/sh");
        let statuses = check_tools(&config, &VersionPrinter { fail: false }).await;

        assert_eq!(statuses.len(), 2);
        assert!(statuses.iter().all(ToolStatus::is_ok));
        assert_eq!(statuses[0].version.as_deref(), Some("--version version 7.0"));
        assert_eq!(statuses[1].version.as_deref(), Some("-version version 7.0"));
    }

    #[tokio::test]
    async fn missing_tool_is_not_run() {
        let config = config_with("/bin/sh", "/nonexistent/bin/ffmpeg");
        let statuses = check_tools(&config, &VersionPrinter { fail: false }).await;

        assert!(statuses[0].is_ok());
        assert!(!statuses[1].is_ok());
        assert!(statuses[1].resolved.is_none());
        assert!(statuses[1].version.is_none());
        assert!(statuses[1].problem.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn failing_version_command_is_a_problem() {
        let config = config_with("/bin/sh", "/bin/sh");
        let statuses = check_tools(&config, &VersionPrinter { fail: true }).await;

        assert!(statuses.iter().all(|s| !s.is_ok()));
        assert!(statuses[0].problem.as_deref().unwrap().contains("exit code 2"));
    }
}
