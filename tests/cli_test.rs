mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;
use utils::run_ytclip_command;

#[test]
fn test_config_path_follows_override() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_ytclip_command(&env, &["config", "path"])?;
    assert_eq!(output.exit_code, 0, "config path failed: {}", output.stderr);
    assert_eq!(output.stdout.trim(), env.config_path().display().to_string());

    Ok(())
}

#[test]
fn test_config_show_uses_defaults_without_creating_a_file() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_ytclip_command(&env, &["config", "show"])?;
    assert_eq!(output.exit_code, 0, "config show failed: {}", output.stderr);
    assert!(output.stdout.contains("timeout_seconds = 300"));
    assert!(output.stdout.contains("burn_language = \"zh-Hans\""));
    assert!(output.stdout.contains("[style]"));
    assert!(!env.config_path().exists());

    Ok(())
}

#[test]
fn test_timeout_flag_overrides_config_file() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_config("timeout_seconds = 60\n")?;

    let output = run_ytclip_command(&env, &["config", "show"])?;
    assert!(output.stdout.contains("timeout_seconds = 60"));

    let output = run_ytclip_command(&env, &["--timeout", "42", "config", "show"])?;
    assert_eq!(output.exit_code, 0, "config show failed: {}", output.stderr);
    assert!(output.stdout.contains("timeout_seconds = 42"));

    Ok(())
}

#[test]
fn test_config_init_refuses_to_overwrite_without_force() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_ytclip_command(&env, &["config", "init"])?;
    assert_eq!(output.exit_code, 0, "config init failed: {}", output.stderr);
    let written = std::fs::read_to_string(env.config_path())?;
    assert!(written.starts_with("# ytclip configuration"));

    let output = run_ytclip_command(&env, &["config", "init"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("--force"), "stderr: {}", output.stderr);

    let output = run_ytclip_command(&env, &["config", "init", "--force"])?;
    assert_eq!(output.exit_code, 0, "forced init failed: {}", output.stderr);

    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_config("[style]\nalignment = \"sideways\"\n")?;

    let output = run_ytclip_command(&env, &["config", "show"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("sideways"), "stderr: {}", output.stderr);

    Ok(())
}

#[test]
fn test_clip_rejects_end_before_start() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_ytclip_command(
        &env,
        &[
            "clip",
            "https://www.youtube.com/watch?v=abc",
            "--start",
            "00:02:00",
            "--end",
            "00:01:00",
        ],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("must be after"), "stderr: {}", output.stderr);

    Ok(())
}

#[test]
fn test_malformed_timestamp_is_a_usage_error() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_ytclip_command(
        &env,
        &["clip", "https://www.youtube.com/watch?v=abc", "--start", "1m", "--end", "00:01:00"],
    )?;
    assert_eq!(output.exit_code, 2);
    assert!(output.stderr.contains("HH:MM:SS"), "stderr: {}", output.stderr);

    Ok(())
}

#[test]
fn test_check_reports_missing_tools() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write_config(
        "[tools]\n\
         yt_dlp = \"/nonexistent/ytclip-test/yt-dlp\"\n\
         ffmpeg = \"/nonexistent/ytclip-test/ffmpeg\"\n",
    )?;

    let output = run_ytclip_command(&env, &["check"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("yt-dlp: "), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("ffmpeg: "), "stderr: {}", output.stderr);
    assert!(output.stderr.contains("missing or broken"));

    Ok(())
}

#[test]
fn test_json_format_emits_one_event_per_line() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_ytclip_command(&env, &["--format", "json", "config", "path"])?;
    assert_eq!(output.exit_code, 0, "config path failed: {}", output.stderr);

    let event: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
    assert_eq!(event["level"], "info");
    assert_eq!(event["code"], "config.path");
    assert_eq!(
        event["message"],
        env.config_path().display().to_string().as_str()
    );

    Ok(())
}

#[test]
fn test_completions_are_generated() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_ytclip_command(&env, &["completions", "bash"])?;
    assert_eq!(output.exit_code, 0, "completions failed: {}", output.stderr);
    assert!(output.stdout.contains("ytclip"));

    Ok(())
}
